//! The stdin command grammar, the local stand-in for a UI event stream.
//!
//! One command per line: `denoise on|off`, `ambient <value>`,
//! `refinement <count>`, `reset`, `quit`.

use anyhow::Context;
use objview::{ControlEvent, ParamValue, ShutdownHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Event(ControlEvent),
    Quit,
}

impl std::str::FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let head = words.next().context("empty command")?;

        let command = match head {
            "reset" => Command::Event(ControlEvent::ResetView),
            "quit" | "exit" => Command::Quit,
            "denoise" => {
                let value = match words.next().context("expected on|off")? {
                    "on" | "true" | "1" => true,
                    "off" | "false" | "0" => false,
                    other => anyhow::bail!("expected on|off, got {other:?}"),
                };
                Command::Event(ControlEvent::SetParameter {
                    name: head.to_owned(),
                    value: ParamValue::Bool(value),
                })
            }
            "ambient" | "refinement" => {
                let value: f64 = words.next().context("expected a value")?.parse()?;
                Command::Event(ControlEvent::SetParameter {
                    name: head.to_owned(),
                    value: ParamValue::Number(value),
                })
            }
            other => anyhow::bail!("unknown command {other:?}"),
        };

        if let Some(extra) = words.next() {
            anyhow::bail!("unexpected trailing input {extra:?}");
        }
        Ok(command)
    }
}

/// Reads commands from stdin until quit, EOF or ctrl-c, then requests
/// shutdown. Malformed lines are logged and skipped.
pub async fn pump_stdin(events: mpsc::Sender<ControlEvent>, shutdown: ShutdownHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,

            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match line.parse::<Command>() {
                        Ok(Command::Quit) => break,
                        Ok(Command::Event(event)) => {
                            if events.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => log::warn!("ignoring {line:?}: {err}"),
                    }
                }
                Ok(None) => {
                    // stdin closed; keep the view alive until ctrl-c
                    let _ = (&mut ctrl_c).await;
                    break;
                }
                Err(err) => {
                    log::warn!("stdin error: {err}");
                    break;
                }
            }
        }
    }

    shutdown.shutdown();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(name: &str, value: ParamValue) -> Command {
        Command::Event(ControlEvent::SetParameter {
            name: name.to_owned(),
            value,
        })
    }

    #[test]
    fn parses_the_published_bindings() {
        assert_eq!(
            "denoise off".parse::<Command>().unwrap(),
            set("denoise", ParamValue::Bool(false))
        );
        assert_eq!(
            "ambient 2.5".parse::<Command>().unwrap(),
            set("ambient", ParamValue::Number(2.5))
        );
        assert_eq!(
            "refinement 8".parse::<Command>().unwrap(),
            set("refinement", ParamValue::Number(8.0))
        );
        assert_eq!(
            "reset".parse::<Command>().unwrap(),
            Command::Event(ControlEvent::ResetView)
        );
        assert_eq!("quit".parse::<Command>().unwrap(), Command::Quit);
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_malformed_lines() {
        for bad in [
            "",
            "denoise",
            "denoise maybe",
            "ambient",
            "ambient high",
            "refinement 8 9",
            "warp 9",
        ] {
            assert!(bad.parse::<Command>().is_err(), "{bad:?} should not parse");
        }
    }
}
