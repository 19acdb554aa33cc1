//! Interactive conversion form.
//!
//! The terminal counterpart of a converter window: the user picks a source
//! and a target currency, types an amount and gets the result. Every line is
//! handed to [`Form::submit`], which turns it into at most one call to the
//! converter. A failed submission leaves the selection and the last result as
//! they were. `swap` flips the currencies and, once something has been
//! converted, converts the last result back.

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::debug;

use crate::cli::convert::render_conversion;
use crate::cli::ui::{StyleType, new_spinner, style_text, user_message};
use crate::core::config::DefaultsConfig;
use crate::core::conversion::{Conversion, Converter, format_amount};
use crate::core::currency::{CurrencyCode, RateProvider};

const HELP: &str = "\
Commands:
  <amount>               convert using the current currencies
  <amount> <FROM> <TO>   pick both currencies and convert
  from <CODE>            change the source currency
  to <CODE>              change the target currency
  swap                   swap source and target, converting the last result back
  help                   show this help
  quit                   leave the form";

#[derive(Debug, Clone, PartialEq)]
enum Action<'a> {
    Convert(&'a str),
    ConvertWith {
        amount: &'a str,
        source: &'a str,
        target: &'a str,
    },
    SetSource(&'a str),
    SetTarget(&'a str),
    Swap,
    Help,
    Quit,
    Nothing,
    Unknown,
}

fn parse_action(line: &str) -> Action<'_> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        [] => Action::Nothing,
        [cmd] => match cmd.to_lowercase().as_str() {
            "swap" => Action::Swap,
            "help" | "?" => Action::Help,
            "quit" | "exit" | "q" => Action::Quit,
            _ => Action::Convert(*cmd),
        },
        [cmd, code] if cmd.eq_ignore_ascii_case("from") => Action::SetSource(*code),
        [cmd, code] if cmd.eq_ignore_ascii_case("to") => Action::SetTarget(*code),
        [amount, source, target] => Action::ConvertWith {
            amount: *amount,
            source: *source,
            target: *target,
        },
        _ => Action::Unknown,
    }
}

/// What the form shows after a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Converted(Vec<String>),
    Error(String),
    Info(String),
    Quit,
}

pub struct Form<'c, P: RateProvider> {
    converter: &'c Converter<P>,
    pub source: CurrencyCode,
    pub target: CurrencyCode,
    /// Last successful conversion.
    pub last: Option<Conversion>,
}

impl<'c, P: RateProvider> Form<'c, P> {
    pub fn new(converter: &'c Converter<P>, defaults: &DefaultsConfig) -> Self {
        Form {
            converter,
            source: defaults.source,
            target: defaults.target,
            last: None,
        }
    }

    pub fn prompt(&self) -> String {
        format!("[{} → {}] amount> ", self.source, self.target)
    }

    pub async fn submit(&mut self, line: &str) -> Response {
        match parse_action(line) {
            Action::Nothing => Response::Info("Please enter an amount to convert.".to_string()),
            Action::Help => Response::Info(HELP.to_string()),
            Action::Quit => Response::Quit,
            Action::Unknown => Response::Error(format!(
                "Unrecognised input '{}'. Type 'help' for commands.",
                line.trim()
            )),
            Action::Swap => {
                std::mem::swap(&mut self.source, &mut self.target);
                // The displayed value goes back in, as if typed by the user
                let last_amount = self.last.as_ref().map(|last| format_amount(last.rounded()));
                match last_amount {
                    Some(amount) => {
                        let (source, target) = (self.source.to_string(), self.target.to_string());
                        self.convert(&amount, &source, &target).await
                    }
                    None => Response::Info(format!("Converting {} → {}", self.source, self.target)),
                }
            }
            Action::SetSource(code) => match code.parse::<CurrencyCode>() {
                Ok(code) => {
                    self.source = code;
                    Response::Info(format!("Converting {} → {}", self.source, self.target))
                }
                Err(e) => Response::Error(user_message(&e)),
            },
            Action::SetTarget(code) => match code.parse::<CurrencyCode>() {
                Ok(code) => {
                    self.target = code;
                    Response::Info(format!("Converting {} → {}", self.source, self.target))
                }
                Err(e) => Response::Error(user_message(&e)),
            },
            Action::Convert(amount) => {
                let (source, target) = (self.source.to_string(), self.target.to_string());
                self.convert(amount, &source, &target).await
            }
            Action::ConvertWith {
                amount,
                source,
                target,
            } => self.convert(amount, source, target).await,
        }
    }

    async fn convert(&mut self, amount: &str, source: &str, target: &str) -> Response {
        let spinner = new_spinner("Fetching exchange rates...");
        let result = self.converter.convert_input(source, target, amount).await;
        spinner.finish_and_clear();

        match result {
            Ok(conversion) => {
                self.source = conversion.request.source;
                self.target = conversion.request.target;
                let lines = render_conversion(&conversion);
                self.last = Some(conversion);
                Response::Converted(lines)
            }
            Err(e) => {
                debug!(error = %e, "Form conversion failed");
                Response::Error(user_message(&e))
            }
        }
    }
}

/// Runs the form until `quit` or end of input.
pub async fn run<P, R, W>(
    converter: &Converter<P>,
    defaults: &DefaultsConfig,
    mut input: R,
    mut output: W,
) -> Result<Option<Conversion>>
where
    P: RateProvider,
    R: BufRead,
    W: Write,
{
    let mut form = Form::new(converter, defaults);
    writeln!(
        output,
        "{}",
        style_text("Currency converter", StyleType::Title)
    )?;
    writeln!(output, "{}", style_text("Type 'help' for commands.", StyleType::Subtle))?;

    let mut line = String::new();
    loop {
        write!(output, "{}", form.prompt())?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }

        match form.submit(&line).await {
            Response::Converted(lines) => {
                for l in lines {
                    writeln!(output, "{l}")?;
                }
            }
            Response::Error(message) => {
                writeln!(output, "{}", style_text(&message, StyleType::Error))?;
            }
            Response::Info(message) => writeln!(output, "{message}")?,
            Response::Quit => break,
        }
    }

    Ok(form.last)
}
