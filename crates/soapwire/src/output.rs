use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use soapwire_envelope::{to_xml, Element};
use soapwire_service::{Disposition, Outcome};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
pub struct OutcomeOutput {
    pub index: usize,
    pub success: bool,
    pub status: &'static str,
    /// Clark-notation name of the result element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OutcomeOutput {
    pub fn new(index: usize, outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Success => Self {
                index,
                success: true,
                status: "success",
                element: None,
                xml: None,
                message: None,
            },
            Outcome::Item(element) => Self {
                index,
                success: true,
                status: "item",
                element: Some(element.name.to_string()),
                xml: Some(render(element)),
                message: None,
            },
            Outcome::Notice(message) => Self {
                index,
                success: true,
                status: "notice",
                element: None,
                xml: None,
                message: Some(message.clone()),
            },
            Outcome::Warning(message) => Self {
                index,
                success: false,
                status: "warning",
                element: None,
                xml: None,
                message: Some(message.clone()),
            },
        }
    }
}

#[derive(Serialize)]
struct OutcomesOutput<'a> {
    schema_id: &'static str,
    operation: &'a str,
    count: usize,
    outcomes: &'a [OutcomeOutput],
}

pub fn print_outcomes(operation: &str, outcomes: &[Outcome], format: OutputFormat) {
    let rows: Vec<OutcomeOutput> = outcomes
        .iter()
        .enumerate()
        .map(|(index, outcome)| OutcomeOutput::new(index, outcome))
        .collect();

    match format {
        OutputFormat::Json => {
            let out = OutcomesOutput {
                schema_id: "https://schemas.3leaps.dev/soapwire/cli/v1/outcomes.schema.json",
                operation,
                count: rows.len(),
                outcomes: &rows,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "STATUS", "ELEMENT", "DETAIL"]);
            for row in &rows {
                table.add_row(vec![
                    row.index.to_string(),
                    row.status.to_string(),
                    row.element.clone().unwrap_or_default(),
                    row.message.clone().or_else(|| row.xml.clone()).unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{operation}: {} outcome(s)", rows.len());
            for row in &rows {
                match (&row.element, &row.message) {
                    (Some(element), _) => println!("  [{}] {} {element}", row.index, row.status),
                    (None, Some(message)) => println!("  [{}] {} {message}", row.index, row.status),
                    (None, None) => println!("  [{}] {}", row.index, row.status),
                }
            }
        }
    }
}

#[derive(Serialize)]
struct CodeOutput<'a> {
    code: &'a str,
    disposition: &'static str,
}

#[derive(Serialize)]
struct CodesOutput<'a> {
    schema_id: &'static str,
    count: usize,
    codes: Vec<CodeOutput<'a>>,
}

pub fn print_codes(entries: &[(&str, Disposition)], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = CodesOutput {
                schema_id: "https://schemas.3leaps.dev/soapwire/cli/v1/response-codes.schema.json",
                count: entries.len(),
                codes: entries
                    .iter()
                    .map(|(code, disposition)| CodeOutput {
                        code,
                        disposition: disposition.as_str(),
                    })
                    .collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CODE", "DISPOSITION"]);
            for (code, disposition) in entries {
                table.add_row(vec![code.to_string(), disposition.as_str().to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (code, disposition) in entries {
                println!("{code:<48} {}", disposition.as_str());
            }
        }
    }
}

#[derive(Serialize)]
struct EnvelopesOutput<'a> {
    schema_id: &'static str,
    operation: &'a str,
    envelopes: &'a [String],
}

/// Print request envelopes. Non-JSON formats print the XML, one per line.
pub fn print_envelopes(operation: &str, envelopes: &[String], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EnvelopesOutput {
                schema_id: "https://schemas.3leaps.dev/soapwire/cli/v1/request-envelopes.schema.json",
                operation,
                envelopes,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            for envelope in envelopes {
                println!("{envelope}");
            }
        }
    }
}

fn render(element: &Element) -> String {
    to_xml(element).unwrap_or_else(|err| format!("<unprintable: {err}>"))
}
