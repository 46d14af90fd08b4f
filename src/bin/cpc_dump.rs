use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use dialoguer::Confirm;
use indoc::indoc;
use log::LevelFilter;
use serde::Serialize;
use simplelog::{Config, SimpleLogger};

use omacp::{
    Analysis, MessageSettings, PlainXml, ProvisioningContext, ProvisioningMessage, SecurityScheme,
};

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

#[derive(Copy, Clone, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Serialize)]
struct Report<'a> {
    security: SecurityScheme,
    #[serde(flatten)]
    analysis: &'a Analysis,
    model: &'a ProvisioningContext,
}

struct CpcDump {
    input: String,
    output_format: OutputFormat,
    settings: MessageSettings,
    output_target: Option<PathBuf>,
    confirm_overwrite: bool,
    verbosity_level: Option<LevelFilter>,
}

impl CpcDump {
    fn from_cli_matches(matches: &ArgMatches) -> Result<Self> {
        let input = matches
            .get_one::<String>("INPUT")
            .context("an input path is required")?
            .clone();

        let output_format = match matches.get_one::<String>("output-format").map(String::as_str) {
            Some("text") => OutputFormat::Text,
            _ => OutputFormat::Json,
        };

        let mut settings = MessageSettings::new().verify_mac(!matches.get_flag("no-verify"));
        if let Some(imsi) = matches.get_one::<String>("imsi") {
            settings = settings.imsi(imsi.as_str());
        }
        if let Some(pin) = matches.get_one::<String>("pin") {
            settings = settings.pin(pin.as_str());
        }

        let verbosity_level = match matches.get_count("verbose") {
            0 => None,
            1 => Some(LevelFilter::Info),
            2 => Some(LevelFilter::Debug),
            3 => Some(LevelFilter::Trace),
            _ => {
                eprintln!("using more than -vvv does not affect verbosity level");
                Some(LevelFilter::Trace)
            }
        };

        Ok(CpcDump {
            input,
            output_format,
            settings,
            output_target: matches.get_one::<String>("output-target").map(PathBuf::from),
            confirm_overwrite: !matches.get_flag("no-confirm-overwrite"),
            verbosity_level,
        })
    }

    fn run(&self) -> Result<()> {
        self.try_to_initialize_logging();

        let data = self.read_input()?;
        let message = if looks_like_markup(&data) {
            ProvisioningMessage::from_document(&data)
        } else {
            ProvisioningMessage::from_push(&data, &PlainXml, &self.settings)
        }
        .with_context(|| format!("failed to process `{}`", self.input))?;

        let rendered = match self.output_format {
            OutputFormat::Json => {
                let report = Report {
                    security: message.security(),
                    analysis: message.analysis(),
                    model: message.context(),
                };
                serde_json::to_string_pretty(&report)?
            }
            OutputFormat::Text => render_text(&message),
        };

        let mut output: Box<dyn Write> = match &self.output_target {
            Some(path) => Box::new(create_output_file(path, self.confirm_overwrite)?),
            None => Box::new(io::stdout()),
        };
        writeln!(output, "{}", rendered)?;
        Ok(())
    }

    fn read_input(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        if self.input == "-" {
            io::stdin()
                .read_to_end(&mut data)
                .context("failed to read stdin")?;
        } else {
            File::open(&self.input)
                .and_then(|mut f| f.read_to_end(&mut data))
                .with_context(|| format!("failed to read `{}`", self.input))?;
        }
        Ok(data)
    }

    fn try_to_initialize_logging(&self) {
        if let Some(level) = self.verbosity_level {
            if let Err(e) = SimpleLogger::init(level, Config::default()) {
                eprintln!("Failed to initialize logging: {}", e);
            }
        }
    }
}

/// Bare documents start with markup, push messages with a binary transaction id.
fn looks_like_markup(data: &[u8]) -> bool {
    data.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'<')
}

fn render_text(message: &ProvisioningMessage) -> String {
    let analysis = message.analysis();
    let provisioned: Vec<&str> = analysis.provisioned.names().collect();

    let mut text = String::new();
    text.push_str(&format!("security: {}\n", message.security()));
    text.push_str(&format!("provisioned: {}\n", provisioned.join(", ")));
    if !analysis.dm_sessions.is_empty() {
        text.push_str(&format!("dm sessions: {}\n", analysis.dm_sessions.join(", ")));
    }
    text.push('\n');
    text.push_str(&message.tree().dump());
    text
}

/// If `prompt` is passed, will display a confirmation prompt before overwriting files.
fn create_output_file(path: &Path, prompt: bool) -> Result<File> {
    if path.is_dir() {
        bail!(
            "There is a directory at {}, refusing to overwrite",
            path.display()
        );
    }

    if path.exists() {
        if prompt {
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Are you sure you want to override output file at {}",
                    path.display()
                ))
                .default(false)
                .interact()
                .context("Failed to write confirmation prompt to term")?;
            if !confirmed {
                bail!("Cancelled");
            }
        }
    } else if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    Ok(File::create(path)?)
}

fn command() -> Command {
    Command::new("cpc_dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility to inspect OMA Client Provisioning messages")
        .long_about(indoc!(r#"
            Utility to inspect OMA Client Provisioning messages.

            The input is either a bare provisioning document (markup) or a WAP push
            message. Push messages are authenticated with the given IMSI and PIN, and
            their body must already be textual markup.
        "#))
        .arg(
            Arg::new("INPUT")
                .required(true)
                .help("Path of the message to inspect, `-` for stdin."),
        )
        .arg(
            Arg::new("output-format")
                .short('o')
                .long("format")
                .value_parser(["json", "text"])
                .default_value("json")
                .help("Sets the output format"),
        )
        .arg(
            Arg::new("imsi")
                .long("imsi")
                .value_name("DIGITS")
                .help("IMSI of the subscriber, used by the NETWPIN and USERNETWPIN schemes."),
        )
        .arg(
            Arg::new("pin")
                .long("pin")
                .value_name("PIN")
                .help("User PIN, used by the USERPIN, USERNETWPIN and USERPINMAC schemes."),
        )
        .arg(
            Arg::new("no-verify")
                .long("no-verify")
                .action(ArgAction::SetTrue)
                .help("When set, push messages are not authenticated."),
        )
        .arg(
            Arg::new("output-target")
                .long("output")
                .short('f')
                .value_name("PATH")
                .help(indoc!("
                    Writes output to the file specified instead of stdout, errors will still be printed to stderr.
                    Will ask for confirmation before overwriting files, to allow overwriting, pass `--no-confirm-overwrite`.
                    Will create parent directories if needed."
                )),
        )
        .arg(
            Arg::new("no-confirm-overwrite")
                .long("no-confirm-overwrite")
                .action(ArgAction::SetTrue)
                .help("When set, will not ask for confirmation before overwriting files, useful for automation"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("-v - info, -vv - debug, -vvv - trace."),
        )
}

fn main() {
    let matches = command().get_matches();

    let result = CpcDump::from_cli_matches(&matches).and_then(|app| app.run());
    if let Err(e) = result {
        eprintln!("{:#}", e);
        exit(1);
    }
}
