use serde::Serialize;
use taskboard_domain::{Board, TaskCard, TaskList};

#[derive(Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    pub api_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Plain-text rendering used when `--json` is not given.
pub trait TextRender {
    fn render(&self) -> String;
}

impl TextRender for TaskCard {
    fn render(&self) -> String {
        let mut line = format!("#{} [{}] {}", self.id, self.priority, self.title);
        if let Some(group) = &self.group {
            line.push_str(&format!(" ({})", group));
        }
        if let Some(description) = &self.description {
            line.push_str(&format!("\n      {}", description));
        }
        line
    }
}

impl TextRender for TaskList {
    fn render(&self) -> String {
        let mut out = format!("{} {} ({} cards)", self.id, self.title, self.len());
        for card in self.cards() {
            out.push_str(&format!("\n  {}. {}", card.position, card.render()));
        }
        out
    }
}

impl TextRender for Board {
    fn render(&self) -> String {
        if self.lists().is_empty() {
            return "No lists".to_string();
        }
        self.lists()
            .iter()
            .map(TextRender::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Serialize)]
pub struct Deleted {
    pub kind: &'static str,
    pub deleted: i64,
}

impl TextRender for Deleted {
    fn render(&self) -> String {
        format!("Deleted {} {}", self.kind, self.deleted)
    }
}

pub fn output_success<T: Serialize + TextRender>(
    format: OutputFormat,
    data: &T,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{}", data.render()),
        OutputFormat::Json => {
            let response = CliResponse {
                success: true,
                api_version: env!("CARGO_PKG_VERSION"),
                data: Some(data),
                error: None,
            };
            println!("{}", serde_json::to_string(&response)?);
        }
    }
    Ok(())
}

/// Prints the error and terminates the process with exit code 1.
pub fn output_error(format: OutputFormat, message: &str) -> ! {
    match format {
        OutputFormat::Text => eprintln!("error: {}", message),
        OutputFormat::Json => {
            let response: CliResponse<()> = CliResponse {
                success: false,
                api_version: env!("CARGO_PKG_VERSION"),
                data: None,
                error: Some(message.to_string()),
            };
            match serde_json::to_string(&response) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("error: {}", message),
            }
        }
    }
    std::process::exit(1);
}
