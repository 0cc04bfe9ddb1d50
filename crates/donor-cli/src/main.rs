use std::env;
use std::io::{self, BufRead, Write};

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use donor_api::RequestQuery;
use donor_connect::{DonorConnect, DonorConnectConfig, PledgeFilter, ProfileUpdateOutcome};
use donor_core::dates::parse_datetime;
use donor_core::validation::validate_notes;
use donor_core::{BloodType, CancellationReason, PledgeStatus, ProfileChanges, RegistrationForm, RequestFilter, RequestSort};

mod display;

/// Session database used when `DONOR_STORAGE_URL` is not set.
const DEFAULT_STORAGE_URL: &str = "sqlite:donorconnect.db?mode=rwc";

#[derive(Debug, Parser)]
#[command(name = "donor")]
#[command(about = "DonorConnect client: sign in, browse requests and manage pledges")]
struct Args {
    /// SQLite URL of the session store. Falls back to DONOR_STORAGE_URL.
    #[arg(long, global = true)]
    storage: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in. The password is read from DONOR_PASSWORD or prompted for.
    Login {
        #[arg(long)]
        email: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in donor
    Whoami,

    /// Create a donor account
    Register(RegisterArgs),

    /// Show or edit the donor profile
    Profile(ProfileArgs),

    /// Manage pledges
    #[command(subcommand)]
    Pledges(PledgeCommand),

    /// Browse blood donation requests
    Requests(RequestArgs),

    /// List blood transfusion centers
    Centers {
        /// Only centers in this wilaya
        #[arg(long)]
        wilaya: Option<i64>,
    },

    /// Follow a center's donation requests
    Subscribe {
        /// Center id
        btc_id: String,
    },

    /// List followed centers
    Subscriptions,

    /// List wilayas, or the communes of one wilaya
    Wilayas {
        /// Show the communes of this wilaya instead
        #[arg(long)]
        communes_of: Option<i64>,
    },
}

#[derive(Debug, clap::Args)]
struct RegisterArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    /// National identity number
    #[arg(long)]
    nin: String,
    #[arg(long)]
    phone: String,
    /// Blood type label (e.g. O-) or code (1-8)
    #[arg(long)]
    blood_type: String,
    /// YYYY-MM-DD
    #[arg(long)]
    birth_date: Option<NaiveDate>,
    #[arg(long)]
    commune: Option<i64>,
}

#[derive(Debug, clap::Args)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,
    /// Blood type label (e.g. O-) or code (1-8)
    #[arg(long)]
    blood_type: Option<String>,
    #[arg(long)]
    commune: Option<i64>,
    #[arg(long)]
    phone: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    birth_date: Option<NaiveDate>,
    /// YYYY-MM-DD
    #[arg(long)]
    last_donation: Option<NaiveDate>,
    #[arg(long)]
    notes: Option<String>,

    #[arg(long)]
    notify_email: Option<bool>,
    #[arg(long)]
    notify_sms: Option<bool>,
    #[arg(long)]
    notify_urgent: Option<bool>,
    #[arg(long)]
    notify_nearby: Option<bool>,
    #[arg(long)]
    show_profile: Option<bool>,
    #[arg(long)]
    show_blood_type: Option<bool>,
    #[arg(long)]
    show_contact: Option<bool>,
}

impl ProfileArgs {
    fn changes(&self) -> ProfileChanges {
        ProfileChanges {
            name: self.name.clone(),
            blood_type: self.blood_type.clone(),
            commune_id: self.commune,
            donor_tel: self.phone.clone(),
            birth_date: self.birth_date,
            last_donation_date: self.last_donation,
            notes: self.notes.clone(),
        }
    }

    fn touches_notifications(&self) -> bool {
        self.notify_email.is_some()
            || self.notify_sms.is_some()
            || self.notify_urgent.is_some()
            || self.notify_nearby.is_some()
    }

    fn touches_privacy(&self) -> bool {
        self.show_profile.is_some() || self.show_blood_type.is_some() || self.show_contact.is_some()
    }
}

#[derive(Debug, Subcommand)]
enum PledgeCommand {
    /// List pledges
    List {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },

    /// Pledge against a request
    Create {
        request_id: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Move an appointment
    Reschedule {
        pledge_id: String,
        /// New appointment, RFC 3339 (e.g. 2030-01-15T09:00:00Z)
        #[arg(long)]
        at: String,
    },

    /// Cancel a pledge
    Cancel {
        pledge_id: String,
        /// illness, schedule_conflict, transport_issue, or free text
        #[arg(long)]
        reason: String,
    },

    /// Mark a pledge as honored
    Complete { pledge_id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Active,
    Completed,
    Cancelled,
}

impl From<StatusArg> for PledgeStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Active => PledgeStatus::Active,
            StatusArg::Completed => PledgeStatus::Completed,
            StatusArg::Cancelled => PledgeStatus::Cancelled,
        }
    }
}

#[derive(Debug, clap::Args)]
struct RequestArgs {
    /// Show every request, not only open ones my blood type can serve
    #[arg(long)]
    all: bool,
    #[arg(long)]
    wilaya: Option<i64>,
    /// Only requests for exactly this blood type
    #[arg(long)]
    blood_type: Option<BloodType>,
    /// Only requests of this center
    #[arg(long)]
    center: Option<String>,
    #[arg(long, value_enum, default_value_t = SortArg::Urgency)]
    sort: SortArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Urgency,
    DueDate,
    Quantity,
}

impl From<SortArg> for RequestSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Urgency => RequestSort::Urgency,
            SortArg::DueDate => RequestSort::DueDate,
            SortArg::Quantity => RequestSort::Quantity,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let storage_url = args
        .storage
        .clone()
        .or_else(|| env::var("DONOR_STORAGE_URL").ok())
        .unwrap_or_else(|| DEFAULT_STORAGE_URL.to_string());
    debug!("Using session store {}", storage_url);

    let config = DonorConnectConfig::from_env()?.with_storage_url(storage_url);
    let app = DonorConnect::open(config).await?;

    run(&app, args.command).await
}

async fn run(app: &DonorConnect, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Login { email } => {
            let password = read_password("Password: ")?;
            match app.auth().login(&email, &password).await {
                Ok(user) => println!("Signed in as {} <{}>", user.name, user.email),
                Err(e @ donor_connect::DonorError::UserReconciliation(_)) => {
                    println!("Signed in with a partial profile: {}", e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Command::Logout => {
            app.auth().logout().await;
            println!("Signed out");
        }

        Command::Whoami => match app.session().current() {
            Some(user) => display::user(&user),
            None => println!("Not signed in"),
        },

        Command::Register(args) => {
            let password = read_password("Password: ")?;
            let confirm = read_password("Confirm password: ")?;
            let form = RegistrationForm {
                first_name: args.first_name,
                last_name: args.last_name,
                email: args.email,
                password,
                confirm_password: confirm,
                national_id: args.nin,
                phone: args.phone,
                blood_type: args.blood_type,
                birth_date: args.birth_date,
                commune_id: args.commune,
            };
            app.auth().register(&form).await?;
            println!("Account created, you can now sign in");
        }

        Command::Profile(args) => profile(app, args).await?,

        Command::Pledges(command) => pledges(app, command).await?,

        Command::Requests(args) => {
            let mut filter = if args.all {
                RequestFilter::default()
            } else {
                app.requests().filter_for_donor()
            };
            filter.blood_type = args.blood_type;
            filter.wilaya_id = args.wilaya;
            filter.sort = args.sort.into();

            let query = RequestQuery {
                wilaya_id: args.wilaya,
                blood_type: args.blood_type,
                btc_id: args.center,
                ..Default::default()
            };
            let requests = app.requests().list(&query, &filter).await?;
            if requests.is_empty() {
                println!("No matching requests");
            }
            let now = Utc::now();
            for request in &requests {
                display::request(request, now);
            }
        }

        Command::Centers { wilaya } => {
            for center in app.centers().list_centers(wilaya).await? {
                display::center(&center);
            }
        }

        Command::Subscribe { btc_id } => {
            app.centers().subscribe(&btc_id).await?;
            println!("Subscribed to center {}", btc_id.trim());
        }

        Command::Subscriptions => {
            for subscription in app.centers().subscriptions().await? {
                display::subscription(&subscription);
            }
        }

        Command::Wilayas { communes_of } => match communes_of {
            Some(wilaya_id) => {
                for commune in app.locations().communes(wilaya_id).await? {
                    println!("{:>6}  {}", commune.id, commune.name);
                }
            }
            None => {
                for wilaya in app.locations().wilayas().await? {
                    println!("{:>3}  {}", wilaya.id, wilaya.name);
                }
            }
        },
    }

    Ok(())
}

async fn profile(app: &DonorConnect, args: ProfileArgs) -> Result<(), Box<dyn std::error::Error>> {
    let changes = args.changes();
    if changes.is_empty() && !args.touches_notifications() && !args.touches_privacy() {
        match app.session().current() {
            Some(user) => display::user(&user),
            None => println!("Not signed in"),
        }
        return Ok(());
    }

    if !changes.is_empty() {
        match app.profile().update(&changes).await? {
            ProfileUpdateOutcome::Unchanged => println!("Profile already up to date"),
            ProfileUpdateOutcome::Updated(_) => println!("Profile updated"),
        }
    }

    if args.touches_notifications() {
        let mut prefs = app
            .session()
            .current()
            .map(|u| u.notification_preferences)
            .unwrap_or_default();
        prefs.email = args.notify_email.unwrap_or(prefs.email);
        prefs.sms = args.notify_sms.unwrap_or(prefs.sms);
        prefs.urgent_requests = args.notify_urgent.unwrap_or(prefs.urgent_requests);
        prefs.nearby_requests = args.notify_nearby.unwrap_or(prefs.nearby_requests);
        app.profile().set_notification_preferences(prefs).await?;
        println!("Notification preferences saved");
    }

    if args.touches_privacy() {
        let mut settings = app
            .session()
            .current()
            .map(|u| u.privacy_settings)
            .unwrap_or_default();
        settings.show_profile = args.show_profile.unwrap_or(settings.show_profile);
        settings.show_blood_type = args.show_blood_type.unwrap_or(settings.show_blood_type);
        settings.show_contact = args.show_contact.unwrap_or(settings.show_contact);
        app.profile().set_privacy_settings(settings).await?;
        println!("Privacy settings saved");
    }

    Ok(())
}

async fn pledges(app: &DonorConnect, command: PledgeCommand) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        PledgeCommand::List { status } => {
            let filter = PledgeFilter {
                status: status.map(Into::into),
                ..Default::default()
            };
            let pledges = app.pledges().list(&filter).await?;
            if pledges.is_empty() {
                println!("No pledges");
            }
            for pledge in &pledges {
                display::pledge(pledge);
            }
        }

        PledgeCommand::Create { request_id, notes } => {
            let pledge = app.pledges().create(&request_id, notes.as_deref()).await?;
            println!("Pledge {} created", pledge.id);
            display::pledge(&pledge);
        }

        PledgeCommand::Reschedule { pledge_id, at } => {
            let appointment = appointment_arg(&at, Utc::now())?;
            // The cache is per process; load it so terminal states are checked.
            app.pledges().list(&PledgeFilter::default()).await?;
            app.pledges().reschedule(&pledge_id, appointment).await?;
            println!("Pledge {} rescheduled to {}", pledge_id, appointment.format("%Y-%m-%d %H:%M"));
        }

        PledgeCommand::Cancel { pledge_id, reason } => {
            let reason = reason_arg(&reason)?;
            app.pledges().list(&PledgeFilter::default()).await?;
            app.pledges().cancel_with(&pledge_id, reason).await?;
            println!("Pledge {} cancelled", pledge_id);
        }

        PledgeCommand::Complete { pledge_id } => {
            app.pledges().list(&PledgeFilter::default()).await?;
            app.pledges().complete(&pledge_id).await?;
            println!("Pledge {} completed", pledge_id);
        }
    }

    Ok(())
}

fn appointment_arg(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    let appointment = parse_datetime(raw).ok_or_else(|| format!("Invalid appointment date: {}", raw))?;
    if appointment <= now {
        return Err(format!("Appointment must be in the future: {}", raw));
    }
    Ok(appointment)
}

fn reason_arg(raw: &str) -> Result<CancellationReason, String> {
    let reason = CancellationReason::parse(raw).ok_or("A cancellation reason is required")?;
    if let CancellationReason::Other(Some(detail)) = &reason {
        validate_notes(detail).map_err(|e| e.to_string())?;
    }
    Ok(reason)
}

fn read_password(prompt: &str) -> Result<SecretString, Box<dyn std::error::Error>> {
    if let Ok(password) = env::var("DONOR_PASSWORD") {
        return Ok(SecretString::from(password));
    }

    eprint!("{}", prompt);
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_pledge_cancel() {
        let args = Args::parse_from(["donor", "pledges", "cancel", "17", "--reason", "illness"]);
        assert!(matches!(
            args.command,
            Command::Pledges(PledgeCommand::Cancel { ref pledge_id, ref reason })
                if pledge_id == "17" && reason == "illness"
        ));
    }

    #[test]
    fn test_parse_requests_blood_type() {
        let args = Args::parse_from(["donor", "requests", "--blood-type", "O-", "--sort", "due-date"]);
        let Command::Requests(requests) = args.command else {
            panic!("expected requests");
        };
        assert_eq!(requests.blood_type, Some(BloodType::ONegative));
        assert!(matches!(requests.sort, SortArg::DueDate));
    }

    #[test]
    fn test_appointment_must_be_future() {
        let now = Utc::now();
        assert!(appointment_arg("2001-02-03T10:00:00Z", now).is_err());
        assert!(appointment_arg("next tuesday", now).is_err());

        let later = appointment_arg("2999-02-03T10:00:00Z", now).unwrap();
        assert!(later > now);
    }

    #[test]
    fn test_reason_checked_locally() {
        assert!(reason_arg("   ").is_err());
        assert!(reason_arg(&"x".repeat(2000)).is_err());
        assert_eq!(reason_arg("schedule conflict").unwrap(), CancellationReason::ScheduleConflict);
    }
}
