use anyhow::Result;
use clap::{Parser, Subcommand};
use eicr_form::gate::{AccessGate, DEFAULT_ACCESS_SECRET};
use eicr_form::init::init_csv;
use eicr_form::{FormField, FormSession, ImageSlot};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Shared access password
    #[arg(short, long, env = "EICR_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    /// Password the gate expects
    #[arg(
        long,
        env = "EICR_ACCESS_SECRET",
        default_value = DEFAULT_ACCESS_SECRET,
        hide_default_value = true,
        hide_env_values = true
    )]
    access_secret: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty work-order CSV with the expected headers
    Init { name: String },

    /// List work orders matching a query
    Search {
        input: PathBuf,
        #[arg(default_value = "")]
        query: String,
    },

    /// Print the form fields a work order fills in
    Show { input: PathBuf, work_order: String },

    /// Fill in and export the form for a work order
    Fill {
        input: PathBuf,
        work_order: String,

        /// Field override, e.g. `--set rating=32A`
        #[arg(short, long = "set", value_parser = parse_assignment)]
        set: Vec<(FormField, String)>,

        #[arg(long)]
        image1: Option<PathBuf>,

        #[arg(long)]
        image2: Option<PathBuf>,

        /// Directory the form is written into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

fn parse_assignment(s: &str) -> Result<(FormField, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got {:?}", s))?;
    let field = name.trim().parse::<FormField>().map_err(|e| e.to_string())?;
    Ok((field, value.to_string()))
}

fn print_form(session: &FormSession) {
    let form = session.form();
    for field in FormField::ALL {
        println!("{:<16} {}", field.name(), form.get(field));
    }
    for slot in [ImageSlot::First, ImageSlot::Second] {
        match form.image(slot) {
            Some(img) => {
                let url = img.to_data_url();
                let preview: String = url.chars().take(48).collect();
                println!(
                    "{:<16} {} ({} bytes) {}...",
                    slot.to_string(),
                    img.file_name,
                    img.bytes.len(),
                    preview
                );
            }
            None => println!("{:<16} -", slot.to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eicr_form=info,eicr=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    // Writing a blank template needs no access.
    if !matches!(args.command, Command::Init { .. }) {
        AccessGate::new(args.access_secret.as_str())
            .verify(args.password.as_deref().unwrap_or_default())?;
    }

    let mut session = FormSession::new();
    match args.command {
        Command::Init { name } => {
            let path = init_csv(&name)?;
            println!("Created dataset template: {}", path.display());
        }
        Command::Search { input, query } => {
            let count = session.import_dataset(&input).await?;
            session.set_query(query);
            let candidates = session.candidates();
            for record in &candidates {
                println!(
                    "{:<20} {}",
                    record.work_order().unwrap_or_default(),
                    record.site_name().unwrap_or_default()
                );
            }
            println!("{} of {} records shown", candidates.len(), count);
        }
        Command::Show { input, work_order } => {
            session.import_dataset(&input).await?;
            session.select_work_order(&work_order)?;
            print_form(&session);
        }
        Command::Fill {
            input,
            work_order,
            set,
            image1,
            image2,
            output,
        } => {
            session.import_dataset(&input).await?;
            session.select_work_order(&work_order)?;
            for (field, value) in set {
                session.set_field(field, value);
            }
            if let Some(path) = image1 {
                session.attach_image(ImageSlot::First, path).await?;
            }
            if let Some(path) = image2 {
                session.attach_image(ImageSlot::Second, path).await?;
            }
            print_form(&session);
            let path = session.export(output).await?;
            println!("Form exported: {}", path.display());
        }
    }
    Ok(())
}
