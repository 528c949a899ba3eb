use hookfeed_core::events::TestEventKind;

/// A dashboard action typed on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Refresh,
    Test(TestEventKind),
    Clear,
    /// Simulate the page being hidden (`true`) or shown again (`false`).
    Visibility { hidden: bool },
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  r, refresh            fetch events now
  t, test <kind>        create a test event (push | pull_request | merge)
  c, clear              clear all events on the server
  hide | show           simulate page visibility changes
  s, status             show connection status and notifications
  h, help               this help
  q, quit               stop polling and exit";

impl std::str::FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err("empty command".to_string());
        };
        let cmd = match head {
            "r" | "refresh" => Command::Refresh,
            "t" | "test" => {
                let kind = words
                    .next()
                    .ok_or_else(|| "test needs an event type".to_string())?;
                Command::Test(kind.parse()?)
            },
            "c" | "clear" => Command::Clear,
            "hide" => Command::Visibility { hidden: true },
            "show" => Command::Visibility { hidden: false },
            "s" | "status" => Command::Status,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command: {other}")),
        };
        if let Some(extra) = words.next() {
            return Err(format!("unexpected argument: {extra}"));
        }
        Ok(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("r".parse::<Command>(), Ok(Command::Refresh));
        assert_eq!(" refresh ".parse::<Command>(), Ok(Command::Refresh));
        assert_eq!("q".parse::<Command>(), Ok(Command::Quit));
        assert_eq!(
            "hide".parse::<Command>(),
            Ok(Command::Visibility { hidden: true })
        );
    }

    #[test]
    fn parses_test_kinds() {
        assert_eq!(
            "t pr".parse::<Command>(),
            Ok(Command::Test(TestEventKind::PullRequest))
        );
        assert_eq!(
            "test merge".parse::<Command>(),
            Ok(Command::Test(TestEventKind::Merge))
        );
        assert!("test".parse::<Command>().is_err());
        assert!("test release".parse::<Command>().is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<Command>().is_err());
        assert!("launch".parse::<Command>().is_err());
        assert!("refresh now".parse::<Command>().is_err());
    }
}
