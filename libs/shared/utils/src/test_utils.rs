use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use shared_config::ClientConfig;
use shared_gateway::{ApiClient, ApiGateway, MemoryTokenStore};
use shared_models::auth::{User, UserRole};

use crate::confirm::Confirm;

pub const TEST_TOKEN: &str = "test-token";

pub struct TestConfig {
    pub api_base_url: String,
    pub token_dir: PathBuf,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            token_dir: std::env::temp_dir().join("hms-test"),
        }
    }
}

impl TestConfig {
    /// Config pointing at a mock server root, with the `/api` prefix appended.
    pub fn for_server(uri: &str) -> Self {
        Self {
            api_base_url: format!("{}/api", uri),
            ..Self::default()
        }
    }

    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api_base_url.clone(), self.token_dir.clone())
    }
}

/// Gateway against a mock server, already holding [`TEST_TOKEN`].
pub fn test_gateway(uri: &str) -> Arc<dyn ApiGateway> {
    let config = TestConfig::for_server(uri).to_client_config();
    Arc::new(ApiClient::new(&config, Arc::new(MemoryTokenStore::with_token(TEST_TOKEN))))
}

pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

impl TestUser {
    pub fn new(id: i64, username: &str, role: UserRole) -> Self {
        Self {
            id,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            role,
        }
    }

    pub fn doctor(username: &str) -> Self {
        Self::new(2, username, UserRole::Doctor)
    }

    pub fn patient(username: &str) -> Self {
        Self::new(3, username, UserRole::Patient)
    }

    pub fn admin(username: &str) -> Self {
        Self::new(1, username, UserRole::Admin)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            email: Some(self.email.clone()),
            role: self.role,
        }
    }
}

pub struct MockApiResponses;

impl MockApiResponses {
    pub fn success(data: Value) -> Value {
        json!({
            "success": true,
            "message": "ok",
            "data": data
        })
    }

    pub fn success_message(message: &str) -> Value {
        json!({
            "success": true,
            "message": message
        })
    }

    pub fn failure(message: &str) -> Value {
        json!({
            "success": false,
            "message": message,
            "errors": [message]
        })
    }

    pub fn user_response(user: &TestUser) -> Value {
        Self::success(json!({ "user": user.to_user() }))
    }

    pub fn login_response(user: &TestUser, token: &str) -> Value {
        Self::success(json!({
            "token": token,
            "user": user.to_user()
        }))
    }

    pub fn appointment(id: i64, doctor_id: i64, date: &str, time: &str, status: &str) -> Value {
        json!({
            "id": id,
            "patient_id": 3,
            "doctor_id": doctor_id,
            "appointment_date": date,
            "appointment_time": time,
            "status": status,
            "notes": null,
            "patient_name": "Test Patient",
            "doctor_name": "Test Doctor",
            "doctor_specialization": "Cardiology",
            "consultation_fee": 500.0,
            "created_at": "2024-06-01 10:00:00",
            "updated_at": "2024-06-01 10:00:00"
        })
    }

    pub fn appointments_response(appointments: Vec<Value>) -> Value {
        Self::success(json!({ "appointments": appointments }))
    }

    pub fn availability_day(date: &str, morning: bool, evening: bool) -> Value {
        json!({
            "date": date,
            "day_name": "Monday, Jun 10",
            "morning_available": morning,
            "evening_available": evening
        })
    }

    pub fn slot(slot_type: &str, status: &str) -> Value {
        let (time, display, appointment_time) = match slot_type {
            "morning" => ("09:00-13:00", "Morning (9:00 AM - 1:00 PM)", "09:00"),
            _ => ("15:00-19:00", "Evening (3:00 PM - 7:00 PM)", "15:00"),
        };
        json!({
            "slot_type": slot_type,
            "time": time,
            "display": display,
            "status": status,
            "appointment_time": appointment_time
        })
    }

    pub fn slots_response(slots: Vec<Value>) -> Value {
        Self::success(json!({ "slots": slots }))
    }

    pub fn department(name: &str, doctors: Vec<Value>) -> Value {
        json!({
            "id": name.to_lowercase().replace(' ', "_"),
            "name": name,
            "description": format!("{} Department", name),
            "doctor_count": doctors.len(),
            "doctors": doctors
        })
    }

    pub fn doctor(id: i64, name: &str, department: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "department": department,
            "specialization": department,
            "qualification": "MBBS",
            "experience": 8,
            "consultation_fee": 500.0,
            "is_active": true
        })
    }
}

/// Confirmation double that answers every prompt the same way and records it.
pub struct ScriptedConfirm {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirm {
    pub fn accepting() -> Self {
        Self { answer: true, prompts: Mutex::new(Vec::new()) }
    }

    pub fn declining() -> Self {
        Self { answer: false, prompts: Mutex::new(Vec::new()) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::for_server("http://127.0.0.1:4000");
        let client_config = config.to_client_config();

        assert_eq!(client_config.api_base_url, "http://127.0.0.1:4000/api");
        assert!(client_config.is_configured());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor("drsmith");
        assert_eq!(user.email, "drsmith@example.com");
        assert_eq!(user.role, UserRole::Doctor);

        let user_model = user.to_user();
        assert_eq!(user_model.username, "drsmith");
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_scripted_confirm_records_prompts() {
        let confirm = ScriptedConfirm::declining();
        assert!(!confirm.confirm("Cancel this appointment?"));
        assert_eq!(confirm.prompts(), vec!["Cancel this appointment?".to_string()]);
    }

    #[test]
    fn test_slot_fixture_times() {
        let slot = MockApiResponses::slot("evening", "available");
        assert_eq!(slot["appointment_time"], "15:00");
    }
}
