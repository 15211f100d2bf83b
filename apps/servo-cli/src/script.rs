//! A tiny timestamped command script format for the demo harness:
//!
//! ```text
//! # comment
//! 0.0 twist 0.1 0.0 0.0  0.0 0.0 0.0
//! 1.5 jog joint_0=0.2 joint_1=-0.1
//! ```
//!
//! Twist lines give linear xyz then angular xyz in the default (empty)
//! frame. Jog lines list `name=velocity` pairs.

use anyhow::{Context, Result, bail};
use servo_types::{JointJogCmd, Stamp, TwistCmd};

#[derive(Debug, Clone)]
pub enum Command {
    Twist(TwistCmd),
    Jog(JointJogCmd),
}

#[derive(Debug, Clone)]
pub struct TimedCommand {
    pub at: f64,
    pub command: Command,
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    pub commands: Vec<TimedCommand>,
}

impl Script {
    pub fn parse(text: &str) -> Result<Self> {
        let mut commands = Vec::new();
        for (line_no, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parsed = parse_line(line)
                .with_context(|| format!("line {}: {raw_line:?}", line_no + 1))?;
            commands.push(parsed);
        }
        commands.sort_by(|a, b| a.at.total_cmp(&b.at));
        Ok(Self { commands })
    }

    pub fn duration(&self) -> f64 {
        self.commands.last().map_or(0.0, |c| c.at)
    }
}

fn parse_line(line: &str) -> Result<TimedCommand> {
    let mut parts = line.split_whitespace();
    let at: f64 = parts.next().context("missing timestamp")?.parse().context("invalid timestamp")?;
    let kind = parts.next().context("missing command kind")?;

    let command = match kind {
        "twist" => {
            let values: Vec<f64> = parts
                .map(|p| p.parse::<f64>().context("invalid twist component"))
                .collect::<Result<_>>()?;
            if values.len() != 6 {
                bail!("twist requires 6 components, got {}", values.len());
            }
            Command::Twist(TwistCmd {
                frame_id: String::new(),
                stamp: Stamp::UNSET,
                linear: [values[0], values[1], values[2]],
                angular: [values[3], values[4], values[5]],
            })
        },
        "jog" => {
            let mut names = Vec::new();
            let mut velocities = Vec::new();
            for token in parts {
                let (name, velocity) =
                    token.split_once('=').context("jog entries must be name=velocity")?;
                names.push(name.to_string());
                velocities.push(velocity.parse::<f64>().context("invalid jog velocity")?);
            }
            Command::Jog(JointJogCmd { names, velocities, stamp: Stamp::UNSET })
        },
        other => bail!("unknown command kind {other:?}"),
    };

    Ok(TimedCommand { at, command })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_twist_and_jog_lines_in_order() {
        let script = Script::parse(
            "# comment\n1.0 jog joint_0=0.2\n0.0 twist 0.1 0.0 0.0 0.0 0.0 0.0\n",
        )
        .unwrap();
        assert_eq!(script.commands.len(), 2);
        assert_eq!(script.commands[0].at, 0.0);
        assert!(matches!(script.commands[0].command, Command::Twist(_)));
        assert_eq!(script.commands[1].at, 1.0);
    }

    #[test]
    fn rejects_malformed_twist() {
        assert!(Script::parse("0.0 twist 0.1 0.0\n").is_err());
    }

    #[test]
    fn ignores_blank_lines_and_comments() {
        let script = Script::parse("\n# nothing here\n\n").unwrap();
        assert!(script.commands.is_empty());
    }
}
