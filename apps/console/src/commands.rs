use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};

use appointment_cell::models::{Actor, AdminPatient, Appointment, SlotBucket, TransitionOutcome, TreatmentForm};
use appointment_cell::services::{AdminBoard, SlotResolver};
use auth_cell::services::SessionService;
use doctor_cell::models::{AvailabilityDay, PatientHistory};
use doctor_cell::services::{AvailabilityManager, DoctorWorkspace};
use patient_cell::services::PatientWorkspace;
use shared_gateway::ApiGateway;
use shared_models::wire::hhmm;
use shared_models::Notices;
use shared_utils::format::{capitalize_status, display_date, format_time_slot, truncate_text};
use shared_utils::Confirm;

pub const USAGE: &str = "\
Usage: hms [--yes] <command> [args]

  --yes answers every confirmation prompt with yes

  login <username> <password>
  logout
  whoami
  availability
  set-availability <YYYY-MM-DD>:<m|e|me|-> ...
  slots <doctor_id> <YYYY-MM-DD>
  book <department> <doctor_id> <YYYY-MM-DD> <HH:MM> [notes...]
  appointments
  cancel <appointment_id>
  complete <appointment_id> <visit_type> <diagnosis> <prescription> <notes...>
  reschedule <appointment_id> <YYYY-MM-DD> <HH:MM>
  patients
  history <patient_id>
  blacklist <patient_id>
  export-history";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { username: String, password: String },
    Logout,
    WhoAmI,
    Availability,
    SetAvailability(Vec<(NaiveDate, Vec<SlotBucket>)>),
    Slots { doctor_id: i64, date: NaiveDate },
    Book {
        department: String,
        doctor_id: i64,
        date: NaiveDate,
        time: NaiveTime,
        notes: String,
    },
    Appointments,
    Cancel { appointment_id: i64 },
    Complete { form: TreatmentForm },
    Reschedule {
        appointment_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    },
    Patients,
    History { patient_id: i64 },
    Blacklist { patient_id: i64 },
    ExportHistory,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let (name, rest) = args.split_first().ok_or_else(|| anyhow!("No command given"))?;

        let command = match (name.as_str(), rest) {
            ("login", [username, password]) => Command::Login {
                username: username.clone(),
                password: password.clone(),
            },
            ("logout", []) => Command::Logout,
            ("whoami", []) => Command::WhoAmI,
            ("availability", []) => Command::Availability,
            ("set-availability", windows) if !windows.is_empty() => Command::SetAvailability(
                windows.iter().map(|w| parse_window(w)).collect::<Result<_>>()?,
            ),
            ("slots", [doctor_id, date]) => Command::Slots {
                doctor_id: parse_id(doctor_id)?,
                date: parse_date(date)?,
            },
            ("book", [department, doctor_id, date, time, notes @ ..]) => Command::Book {
                department: department.clone(),
                doctor_id: parse_id(doctor_id)?,
                date: parse_date(date)?,
                time: parse_time(time)?,
                notes: notes.join(" "),
            },
            ("appointments", []) => Command::Appointments,
            ("cancel", [appointment_id]) => Command::Cancel {
                appointment_id: parse_id(appointment_id)?,
            },
            ("complete", [appointment_id, visit_type, diagnosis, prescription, notes @ ..]) => {
                Command::Complete {
                    form: TreatmentForm {
                        appointment_id: parse_id(appointment_id)?,
                        visit_type: visit_type.clone(),
                        diagnosis: diagnosis.clone(),
                        prescription: prescription.clone(),
                        treatment_notes: notes.join(" "),
                    },
                }
            }
            ("reschedule", [appointment_id, date, time]) => Command::Reschedule {
                appointment_id: parse_id(appointment_id)?,
                date: parse_date(date)?,
                time: parse_time(time)?,
            },
            ("patients", []) => Command::Patients,
            ("history", [patient_id]) => Command::History {
                patient_id: parse_id(patient_id)?,
            },
            ("blacklist", [patient_id]) => Command::Blacklist {
                patient_id: parse_id(patient_id)?,
            },
            ("export-history", []) => Command::ExportHistory,
            (other, _) => bail!("Unknown command or wrong arguments: {}", other),
        };

        Ok(command)
    }

    fn name(&self) -> &'static str {
        match self {
            Command::Login { .. } => "login",
            Command::Logout => "logout",
            Command::WhoAmI => "whoami",
            Command::Availability => "availability",
            Command::SetAvailability(_) => "set-availability",
            Command::Slots { .. } => "slots",
            Command::Book { .. } => "book",
            Command::Appointments => "appointments",
            Command::Cancel { .. } => "cancel",
            Command::Complete { .. } => "complete",
            Command::Reschedule { .. } => "reschedule",
            Command::Patients => "patients",
            Command::History { .. } => "history",
            Command::Blacklist { .. } => "blacklist",
            Command::ExportHistory => "export-history",
        }
    }
}

fn parse_id(value: &str) -> Result<i64> {
    value.parse().with_context(|| format!("Invalid id: {}", value))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").with_context(|| format!("Invalid date: {}", value))
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    hhmm::parse(value).ok_or_else(|| anyhow!("Invalid time: {}", value))
}

/// `2024-06-10:me` opens both windows, `2024-06-10:-` opens neither.
fn parse_window(value: &str) -> Result<(NaiveDate, Vec<SlotBucket>)> {
    let (date, flags) = value
        .split_once(':')
        .ok_or_else(|| anyhow!("Expected <date>:<m|e|me|->, got {}", value))?;

    let mut buckets = Vec::new();
    for flag in flags.chars() {
        match flag {
            'm' | 'M' => buckets.push(SlotBucket::Morning),
            'e' | 'E' => buckets.push(SlotBucket::Evening),
            '-' => {}
            other => bail!("Unknown window flag '{}' in {}", other, value),
        }
    }

    Ok((parse_date(date)?, buckets))
}

pub async fn run(
    command: Command,
    gateway: Arc<dyn ApiGateway>,
    confirm: Arc<dyn Confirm>,
    today: NaiveDate,
) -> Result<()> {
    let session = SessionService::new(Arc::clone(&gateway));

    match command {
        Command::Login { username, password } => {
            let user = session.login(&username, &password).await?;
            println!("Logged in as {} ({})", user.username, user.role);
        }
        Command::Logout => {
            if let Err(e) = session.logout().await {
                warn!("Server logout failed: {}", e);
            }
            println!("Logged out");
        }
        Command::WhoAmI => match session.current_user().await? {
            Some(user) => println!("{} ({}) #{}", user.username, user.role, user.id),
            None => println!("Not logged in"),
        },
        Command::Slots { doctor_id, date } => {
            let slots = SlotResolver::new(gateway).get_available_slots(doctor_id, date).await;
            if slots.is_empty() {
                println!("No open slots for doctor {} on {}", doctor_id, display_date(date));
            }
            for slot in slots {
                println!("{}  {}", slot.appointment_time.format(hhmm::FORMAT), slot.display_label());
            }
        }
        command => {
            let user = session
                .current_user()
                .await?
                .ok_or_else(|| anyhow!("Not logged in. Run `hms login <username> <password>` first"))?;
            let actor = Actor::from(user.role);
            debug!("Running {} as {}", command.name(), actor);

            match actor {
                Actor::Doctor => run_doctor(command, gateway, confirm, today).await?,
                Actor::Patient => run_patient(command, gateway, confirm, today).await?,
                Actor::Admin => run_admin(command, gateway, confirm).await?,
            }
        }
    }

    Ok(())
}

async fn run_doctor(
    command: Command,
    gateway: Arc<dyn ApiGateway>,
    confirm: Arc<dyn Confirm>,
    today: NaiveDate,
) -> Result<()> {
    match command {
        Command::Availability => {
            let mut manager = AvailabilityManager::new(gateway);
            manager.load_availability_days(today).await;
            print_days(&manager.days);
        }
        Command::SetAvailability(windows) => {
            let mut manager = AvailabilityManager::new(gateway);
            manager.load_availability_days(today).await;
            for day in manager.days.iter_mut() {
                day.morning_available = false;
                day.evening_available = false;
            }
            for (date, buckets) in &windows {
                for bucket in buckets {
                    if !manager.toggle(*date, *bucket, true) {
                        bail!("{} is outside the availability window", date);
                    }
                }
            }
            manager.save_availability(today).await?;
            print_notices(&manager.notices);
            print_days(&manager.days);

            let left_open = manager.unrequested_open_windows(&windows);
            if !left_open.is_empty() {
                for (date, bucket) in &left_open {
                    warn!("{} {} is still open on the server", date, bucket.as_str());
                }
                bail!(
                    "{} window(s) not listed are still open; saving only opens windows",
                    left_open.len()
                );
            }
        }
        Command::Appointments => {
            let mut workspace = DoctorWorkspace::new(gateway, confirm, today);
            workspace.view.load_appointments().await?;
            print_appointments(&workspace.view.appointments, Actor::Doctor);
        }
        Command::Cancel { appointment_id } => {
            let mut workspace = DoctorWorkspace::new(gateway, confirm, today);
            workspace.view.load_appointments().await?;
            let outcome = workspace.cancel(appointment_id).await?;
            print_outcome(outcome, &workspace.view.notices);
        }
        Command::Complete { form } => {
            let mut workspace = DoctorWorkspace::new(gateway, confirm, today);
            workspace.view.load_appointments().await?;
            let outcome = workspace.complete(form.appointment_id, &form).await?;
            print_outcome(outcome, &workspace.view.notices);
        }
        Command::Patients => {
            let mut workspace = DoctorWorkspace::new(gateway, confirm, today);
            workspace.view.load_patients().await?;
            if workspace.view.patients.is_empty() {
                println!("No patients");
            }
            for patient in &workspace.view.patients {
                println!("#{:<5} {}", patient.id, patient.name);
            }
        }
        Command::History { patient_id } => {
            let mut workspace = DoctorWorkspace::new(gateway, confirm, today);
            workspace.view.view_patient_history(patient_id).await?;
            if let Some(history) = &workspace.view.patient_history {
                print_history(history);
            }
        }
        other => bail!("`{}` is not available to a doctor", other.name()),
    }
    Ok(())
}

async fn run_patient(
    command: Command,
    gateway: Arc<dyn ApiGateway>,
    confirm: Arc<dyn Confirm>,
    today: NaiveDate,
) -> Result<()> {
    let mut workspace = PatientWorkspace::new(gateway, confirm);

    match command {
        Command::Book {
            department,
            doctor_id,
            date,
            time,
            notes,
        } => {
            workspace.view.load_patient_data().await;
            workspace.select_department(&department)?;
            workspace.select_doctor(doctor_id).await?;
            workspace.select_date(date).await;
            if let Some(error) = workspace.view.notices.error.take() {
                bail!(error);
            }
            workspace.select_slot(time)?;
            workspace.booking.set_notes(notes);
            workspace.book(today).await?;
            print_notices(&workspace.view.notices);
        }
        Command::Appointments => {
            workspace.view.load_patient_data().await;
            print_appointments(&workspace.view.appointments, Actor::Patient);
        }
        Command::Cancel { appointment_id } => {
            workspace.view.load_patient_data().await;
            let outcome = workspace.cancel(appointment_id).await?;
            print_outcome(outcome, &workspace.view.notices);
        }
        Command::ExportHistory => {
            let task_id = workspace.view.export_history().await?;
            print_notices(&workspace.view.notices);
            if let Some(task_id) = task_id {
                debug!("Export task {}", task_id);
            }
        }
        other => bail!("`{}` is not available to a patient", other.name()),
    }
    Ok(())
}

async fn run_admin(command: Command, gateway: Arc<dyn ApiGateway>, confirm: Arc<dyn Confirm>) -> Result<()> {
    let mut board = AdminBoard::new(gateway, confirm);
    board.view.load_appointments().await?;

    match command {
        Command::Appointments => print_appointments(&board.view.appointments, Actor::Admin),
        Command::Cancel { appointment_id } => {
            let outcome = board.cancel(appointment_id).await?;
            print_outcome(outcome, &board.view.notices);
        }
        Command::Reschedule {
            appointment_id,
            date,
            time,
        } => {
            let outcome = board.reschedule(appointment_id, date, time).await?;
            print_outcome(outcome, &board.view.notices);
        }
        Command::Patients => {
            board.view.load_patients().await?;
            print_admin_patients(&board.view.patients);
        }
        Command::History { patient_id } => {
            board.view.load_patient_history(patient_id).await?;
            print_appointments(&board.view.patient_history, Actor::Admin);
        }
        Command::Blacklist { patient_id } => {
            board.view.load_patients().await?;
            let outcome = board.toggle_patient_blacklist(patient_id).await?;
            print_outcome(outcome, &board.view.notices);
        }
        other => bail!("`{}` is not available to an admin", other.name()),
    }
    Ok(())
}

fn print_notices(notices: &Notices) {
    if let Some(success) = &notices.success {
        println!("{}", success);
    }
    if let Some(error) = &notices.error {
        eprintln!("{}", error);
    }
}

fn print_outcome(outcome: TransitionOutcome, notices: &Notices) {
    match outcome {
        TransitionOutcome::Applied => print_notices(notices),
        TransitionOutcome::Dismissed => println!("Nothing changed"),
    }
}

fn print_days(days: &[AvailabilityDay]) {
    for day in days {
        let mark = |open: bool| if open { "x" } else { " " };
        println!(
            "{}  {:<18} [{}] morning  [{}] evening",
            day.date,
            day.day_name,
            mark(day.morning_available),
            mark(day.evening_available)
        );
    }
}

fn print_admin_patients(patients: &[AdminPatient]) {
    if patients.is_empty() {
        println!("No patients");
        return;
    }

    for patient in patients {
        println!(
            "#{:<5} {:<20} {:<14} {}",
            patient.id,
            patient.name,
            patient.phone.as_deref().unwrap_or("N/A"),
            if patient.is_blacklisted { "blacklisted" } else { "" }
        );
    }
}

fn print_history(history: &PatientHistory) {
    println!("{} #{}", history.name, history.id);
    if let Some(notes) = history.medical_history.as_deref() {
        println!("  {}", truncate_text(Some(notes), 60));
    }
    for entry in &history.appointments {
        let doctor = entry.doctor.as_ref().map(|d| d.name.as_str()).unwrap_or("N/A");
        let diagnosis = entry.treatment.as_ref().and_then(|t| t.diagnosis.as_deref());
        println!(
            "  {}  {:<20} {:<10} {:<20} {}",
            entry.appointment_date,
            format_time_slot(entry.appointment_time),
            capitalize_status(entry.status.as_str()),
            doctor,
            truncate_text(diagnosis, 30)
        );
    }
}

fn print_appointments(appointments: &[Appointment], actor: Actor) {
    if appointments.is_empty() {
        println!("No appointments");
        return;
    }

    for (index, appointment) in appointments.iter().enumerate() {
        let counterpart = match actor {
            Actor::Patient => appointment.doctor_name.as_deref(),
            Actor::Doctor => appointment.patient_name.as_deref(),
            Actor::Admin => appointment.patient_name.as_deref(),
        };
        println!(
            "{:>3}. #{:<5} {}  {:<20} {:<10} {:<20} {}",
            index + 1,
            appointment.id,
            appointment.appointment_date,
            format_time_slot(appointment.appointment_time),
            capitalize_status(appointment.status.as_str()),
            counterpart.unwrap_or("N/A"),
            truncate_text(appointment.notes.as_deref(), 30)
        );
    }
}
