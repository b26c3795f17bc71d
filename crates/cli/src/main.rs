use clap::{Parser, Subcommand};
use pms_core::{
    data_file_from_env_value, CoreConfig, NewPatient, PatientError, PatientResult, PatientUpdate,
    RecordService,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "pms")]
#[command(about = "Patient management system CLI")]
struct Cli {
    /// Patient store file (falls back to PMS_DATA_FILE, then patients.json)
    #[arg(long, global = true)]
    data_file: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients
    List,
    /// Show one patient
    Show {
        /// Patient ID
        id: String,
    },
    /// List patients sorted by height, weight or bmi
    Sort {
        /// Field to sort by
        field: String,
        /// asc or desc
        #[arg(long)]
        order: Option<String>,
    },
    /// Create a patient
    Create {
        /// Patient ID
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        city: String,
        #[arg(long, allow_negative_numbers = true)]
        age: i64,
        /// male, female or others
        #[arg(long)]
        gender: String,
        /// Height in metres
        #[arg(long)]
        height: f64,
        /// Weight in kilograms
        #[arg(long)]
        weight: f64,
    },
    /// Update some fields of a patient
    Update {
        /// Patient ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        age: Option<i64>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        height: Option<f64>,
        #[arg(long)]
        weight: Option<f64>,
    },
    /// Delete a patient
    Delete {
        /// Patient ID
        id: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'pms --help' for commands");
        return;
    };

    let data_file = data_file_from_env_value(
        cli.data_file
            .or_else(|| std::env::var("PMS_DATA_FILE").ok()),
    );

    let result = CoreConfig::new(data_file)
        .map(|cfg| RecordService::from_config(&cfg))
        .and_then(|service| run(command, &service));

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Executes one command and renders its output.
fn run(command: Commands, service: &RecordService) -> PatientResult<String> {
    match command {
        Commands::List => to_json(&service.list_all()?),
        Commands::Show { id } => to_json(&service.get(&id)?),
        Commands::Sort { field, order } => to_json(&service.sort_by(&field, order.as_deref())?),
        Commands::Create {
            id,
            name,
            city,
            age,
            gender,
            height,
            weight,
        } => to_json(&service.create(NewPatient {
            id,
            name,
            city,
            age,
            gender,
            height,
            weight,
        })?),
        Commands::Update {
            id,
            name,
            city,
            age,
            gender,
            height,
            weight,
        } => to_json(&service.update(
            &id,
            PatientUpdate {
                name,
                city,
                age,
                gender,
                height,
                weight,
            },
        )?),
        Commands::Delete { id } => {
            service.delete(&id)?;
            Ok(format!("Deleted patient {}", id))
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> PatientResult<String> {
    serde_json::to_string_pretty(value).map_err(PatientError::Serialization)
}
