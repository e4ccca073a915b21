//! Line-oriented control protocol used by the daemon.
//!
//! ```text
//! expire <id> <seconds>   schedule (or refresh) an expiration
//! cancel <id>             cancel a pending expiration
//! has <id>                report whether <id> is pending
//! stats                   print scheduler statistics
//! flush                   write a snapshot now
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::coordinator::ExpiratorHandle;
use crate::expiration::ExpirableId;

/// A parsed control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Expire { id: ExpirableId, ttl: Duration },
    Cancel { id: ExpirableId },
    Has { id: ExpirableId },
    Stats,
    Flush,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid seconds '{0}'")]
    InvalidSeconds(String),
}

impl ControlCommand {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or(ParseError::Empty)?;
        let args: Vec<&str> = parts.collect();

        match (verb, args.as_slice()) {
            ("expire", [id, secs]) => {
                let secs: f64 = secs
                    .parse()
                    .map_err(|_| ParseError::InvalidSeconds(secs.to_string()))?;
                // Negative TTLs are already overdue.
                let ttl = Duration::try_from_secs_f64(secs.max(0.0))
                    .map_err(|_| ParseError::InvalidSeconds(secs.to_string()))?;
                Ok(ControlCommand::Expire {
                    id: (*id).into(),
                    ttl,
                })
            }
            ("expire", _) => Err(ParseError::Usage("expire <id> <seconds>")),
            ("cancel", [id]) => Ok(ControlCommand::Cancel { id: (*id).into() }),
            ("cancel", _) => Err(ParseError::Usage("cancel <id>")),
            ("has", [id]) => Ok(ControlCommand::Has { id: (*id).into() }),
            ("has", _) => Err(ParseError::Usage("has <id>")),
            ("stats", []) => Ok(ControlCommand::Stats),
            ("flush", []) => Ok(ControlCommand::Flush),
            (other, _) => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

/// Apply a command and render the reply line.
pub async fn execute(handle: &ExpiratorHandle, command: ControlCommand) -> String {
    match command {
        ControlCommand::Expire { id, ttl } => {
            handle.schedule_expiration(&id, ttl);
            format!("ok {id} expires in {:.1}s", ttl.as_secs_f64())
        }
        ControlCommand::Cancel { id } => {
            handle.cancel_expiration(&id);
            format!("ok {id} cancelled")
        }
        ControlCommand::Has { id } => {
            let pending = handle.has_expiration(&id).await;
            format!("{id} {}", if pending { "pending" } else { "none" })
        }
        ControlCommand::Stats => match handle.stats().await {
            Some(stats) => format!(
                "pending={} restored={} dirty={} writes={} failures={}",
                stats.pending,
                stats.restored,
                stats.dirty,
                stats.snapshot_writes,
                stats.snapshot_failures
            ),
            None => "error expirator is not running".to_string(),
        },
        ControlCommand::Flush => match handle.flush().await {
            Ok(()) => "ok flushed".to_string(),
            Err(e) => format!("error {e}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            ControlCommand::parse("expire paste-1 2.5").unwrap(),
            ControlCommand::Expire {
                id: "paste-1".into(),
                ttl: Duration::from_millis(2500),
            }
        );
        assert_eq!(
            ControlCommand::parse("  cancel a ").unwrap(),
            ControlCommand::Cancel { id: "a".into() }
        );
        assert_eq!(ControlCommand::parse("has a").unwrap(), ControlCommand::Has { id: "a".into() });
        assert_eq!(ControlCommand::parse("stats").unwrap(), ControlCommand::Stats);
        assert_eq!(ControlCommand::parse("flush").unwrap(), ControlCommand::Flush);
    }

    #[test]
    fn test_negative_ttl_is_immediate() {
        assert_eq!(
            ControlCommand::parse("expire a -10").unwrap(),
            ControlCommand::Expire {
                id: "a".into(),
                ttl: Duration::ZERO,
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ControlCommand::parse("   "), Err(ParseError::Empty));
        assert_eq!(
            ControlCommand::parse("expire a"),
            Err(ParseError::Usage("expire <id> <seconds>"))
        );
        assert_eq!(
            ControlCommand::parse("expire a soon"),
            Err(ParseError::InvalidSeconds("soon".into()))
        );
        assert_eq!(ControlCommand::parse("drop a"), Err(ParseError::Unknown("drop".into())));
    }
}
