use crate::config::SizeUnit;
use crate::error::CommandError;
use partfs::{Fit, FormatType, PartitionType};
use std::str::FromStr;

/// One parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Mkdisk {
        size: u64,
        unit: Option<SizeUnit>,
        fit: Fit,
        path: String,
    },
    Rmdisk {
        path: String,
    },
    Fdisk {
        size: u64,
        unit: Option<SizeUnit>,
        fit: Fit,
        path: String,
        name: String,
        kind: PartitionType,
    },
    Mount {
        path: String,
        name: String,
    },
    Mkfs {
        id: String,
        format: FormatType,
    },
    Mkdir {
        path: String,
        parents: bool,
    },
    Mkfile {
        path: String,
        size: usize,
        parents: bool,
    },
    Cat {
        files: Vec<String>,
    },
    Login {
        user: String,
        pass: String,
        id: String,
    },
    Logout,
    Mkgrp {
        name: String,
    },
    Rmgrp {
        name: String,
    },
    Mkusr {
        user: String,
        pass: String,
        group: String,
    },
    Rmusr {
        user: String,
    },
    Mounted,
}

/// Parses every non-blank, non-comment line of `text`. Parsing stops at nothing: each line
/// yields its own result so the caller can report failures in order.
pub fn parse_script(text: &str) -> Vec<Result<Command, CommandError>> {
    return text.lines().filter_map(|line| parse_line(line).transpose()).collect();
}

/// Parses one line. Blank lines and lines starting with `#` give `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let tokens = tokenize(line)?;
    let (name, rest) = match tokens.split_first() {
        Some(split) => split,
        None => return Ok(None),
    };

    let mut flags = Flags::collect(rest)?;
    let name = name.to_ascii_lowercase();

    let command = match name.as_str() {
        "mkdisk" => Command::Mkdisk {
            size: flags.size("size")?,
            unit: flags.unit()?,
            fit: flags.parsed("fit", Fit::FirstFit)?,
            path: flags.require("path")?,
        },
        "rmdisk" => Command::Rmdisk {
            path: flags.require("path")?,
        },
        "fdisk" => Command::Fdisk {
            size: flags.size("size")?,
            unit: flags.unit()?,
            fit: flags.parsed("fit", Fit::WorstFit)?,
            path: flags.require("path")?,
            name: flags.require("name")?,
            kind: flags.parsed("type", PartitionType::Primary)?,
        },
        "mount" => Command::Mount {
            path: flags.require("path")?,
            name: flags.require("name")?,
        },
        "mkfs" => Command::Mkfs {
            id: flags.require("id")?,
            format: flags.parsed("type", FormatType::default())?,
        },
        "mkdir" => Command::Mkdir {
            path: flags.require("path")?,
            parents: flags.switch("p")?,
        },
        "mkfile" => Command::Mkfile {
            path: flags.require("path")?,
            size: flags.parsed("size", 0usize)?,
            parents: flags.switch("r")?,
        },
        "cat" => Command::Cat {
            files: flags.numbered("file")?,
        },
        "login" => Command::Login {
            user: flags.require("user")?,
            pass: flags.require("pass")?,
            id: flags.require("id")?,
        },
        "logout" => Command::Logout,
        "mkgrp" => Command::Mkgrp {
            name: flags.require("name")?,
        },
        "rmgrp" => Command::Rmgrp {
            name: flags.require("name")?,
        },
        "mkusr" => Command::Mkusr {
            user: flags.require("user")?,
            pass: flags.require("pass")?,
            group: flags.require("grp")?,
        },
        "rmusr" => Command::Rmusr {
            user: flags.require("user")?,
        },
        "mounted" => Command::Mounted,
        _ => return Err(CommandError::Parse(format!("Unknown command '{}'", name))),
    };

    flags.finish(&name)?;

    return Ok(Some(command));
}

/// Splits on whitespace. Double quotes group a value containing spaces and are removed.
fn tokenize(line: &str) -> Result<Vec<String>, CommandError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }

    if in_quotes {
        return Err(CommandError::parse("Unterminated quote"));
    }

    if started {
        tokens.push(current);
    }

    return Ok(tokens);
}

/// The `-key=value` and bare `-key` arguments of a line. Each accessor removes what it reads,
/// so whatever is left at the end is unknown.
struct Flags {
    entries: Vec<(String, Option<String>)>,
}

impl Flags {
    fn collect(tokens: &[String]) -> Result<Self, CommandError> {
        let mut entries: Vec<(String, Option<String>)> = Vec::new();

        for token in tokens {
            let body = match token.strip_prefix('-') {
                Some(body) if !body.is_empty() => body,
                _ => return Err(CommandError::Parse(format!("Unexpected argument '{}'", token))),
            };

            let (key, value) = match body.find('=') {
                Some(i) => (&body[..i], Some(String::from(&body[i + 1..]))),
                None => (body, None),
            };

            let key = key.to_ascii_lowercase();

            if entries.iter().any(|(k, _)| *k == key) {
                return Err(CommandError::Parse(format!("Flag '-{}' was given twice", key)));
            }

            entries.push((key, value));
        }

        return Ok(Self { entries });
    }

    fn take(&mut self, key: &str) -> Option<(String, Option<String>)> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;

        return Some(self.entries.remove(index));
    }

    fn optional(&mut self, key: &str) -> Result<Option<String>, CommandError> {
        return match self.take(key) {
            Some((_, Some(value))) if !value.is_empty() => Ok(Some(value)),
            Some(_) => Err(CommandError::Parse(format!("Flag '-{}' needs a value", key))),
            None => Ok(None),
        };
    }

    fn require(&mut self, key: &str) -> Result<String, CommandError> {
        return match self.optional(key)? {
            Some(value) => Ok(value),
            None => Err(CommandError::Parse(format!("Missing required flag '-{}'", key))),
        };
    }

    fn parsed<T: FromStr>(&mut self, key: &str, default: T) -> Result<T, CommandError> {
        return match self.optional(key)? {
            Some(value) => value
                .parse()
                .map_err(|_| CommandError::Parse(format!("Invalid value '{}' for '-{}'", value, key))),
            None => Ok(default),
        };
    }

    fn size(&mut self, key: &str) -> Result<u64, CommandError> {
        let value = self.require(key)?;

        return match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(CommandError::Parse(format!("Size must be a positive number, got '{}'", value))),
        };
    }

    fn unit(&mut self) -> Result<Option<SizeUnit>, CommandError> {
        return match self.optional("unit")? {
            Some(value) => match value.parse() {
                Ok(unit) => Ok(Some(unit)),
                Err(_) => Err(CommandError::Parse(format!("Invalid unit '{}'", value))),
            },
            None => Ok(None),
        };
    }

    fn switch(&mut self, key: &str) -> Result<bool, CommandError> {
        return match self.take(key) {
            Some((_, None)) => Ok(true),
            Some(_) => Err(CommandError::Parse(format!("Flag '-{}' takes no value", key))),
            None => Ok(false),
        };
    }

    /// Takes `<prefix>1`, `<prefix>2`, ... in numeric order. At least one is required.
    fn numbered(&mut self, prefix: &str) -> Result<Vec<String>, CommandError> {
        let mut numbered = Vec::new();
        let mut i = 0;

        while i < self.entries.len() {
            let n = match self.entries[i].0.strip_prefix(prefix).map(|n| n.parse::<u32>()) {
                Some(Ok(n)) => n,
                _ => {
                    i += 1;
                    continue;
                }
            };

            let key = self.entries[i].0.clone();

            match self.entries.remove(i).1 {
                Some(value) if !value.is_empty() => numbered.push((n, value)),
                _ => return Err(CommandError::Parse(format!("Flag '-{}' needs a value", key))),
            }
        }

        if numbered.is_empty() {
            return Err(CommandError::Parse(format!("Missing required flag '-{}1'", prefix)));
        }

        numbered.sort_by_key(|(n, _)| *n);

        return Ok(numbered.into_iter().map(|(_, v)| v).collect());
    }

    fn finish(self, command: &str) -> Result<(), CommandError> {
        return match self.entries.first() {
            Some((key, _)) => Err(CommandError::Parse(format!(
                "Unknown flag '-{}' for {}",
                key, command
            ))),
            None => Ok(()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, CommandError> {
        return parse_line(line).map(|c| c.unwrap());
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize(r#"mkdir -path="/my docs/a" -p"#).unwrap(),
            vec!["mkdir", "-path=/my docs/a", "-p"]
        );
        assert!(tokenize(r#"mkdir -path="/a"#).is_err());
    }

    #[test]
    fn test_skips_blank_and_comments() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   # mkdisk -size=1").unwrap(), None);
    }

    #[test]
    fn test_mkdisk_defaults() {
        assert_eq!(
            parse("MKDISK -Size=10 -PATH=/tmp/a.dsk").unwrap(),
            Command::Mkdisk {
                size: 10,
                unit: None,
                fit: Fit::FirstFit,
                path: String::from("/tmp/a.dsk"),
            }
        );
    }

    #[test]
    fn test_fdisk() {
        assert_eq!(
            parse("fdisk -size=300 -unit=k -path=/tmp/a.dsk -name=Part1 -type=E -fit=bf").unwrap(),
            Command::Fdisk {
                size: 300,
                unit: Some(SizeUnit::Kilobytes),
                fit: Fit::BestFit,
                path: String::from("/tmp/a.dsk"),
                name: String::from("Part1"),
                kind: PartitionType::Extended,
            }
        );

        match parse("fdisk -size=1 -path=/a -name=b").unwrap() {
            Command::Fdisk { fit, kind, .. } => {
                assert_eq!(fit, Fit::WorstFit);
                assert_eq!(kind, PartitionType::Primary);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_switches() {
        assert_eq!(
            parse("mkdir -p -path=/a/b").unwrap(),
            Command::Mkdir {
                path: String::from("/a/b"),
                parents: true,
            }
        );
        assert!(parse("mkdir -path=/a -p=yes").is_err());
    }

    #[test]
    fn test_cat_orders_files() {
        assert_eq!(
            parse("cat -file2=/b -file10=/c -file1=/a").unwrap(),
            Command::Cat {
                files: vec![String::from("/a"), String::from("/b"), String::from("/c")],
            }
        );
        assert!(parse("cat").is_err());
    }

    #[test]
    fn test_errors() {
        assert!(parse("format -id=1").is_err());
        assert!(parse("mount -path=/a").is_err());
        assert!(parse("mount -path=/a -name=b -extra=1").is_err());
        assert!(parse("mount -path=/a -path=/b -name=c").is_err());
        assert!(parse("mkdisk -size=-4 -path=/a").is_err());
        assert!(parse("mkdisk -size=4 -unit=G -path=/a").is_err());
        assert!(parse("mkfs -id=781A -type=slow").is_err());
        assert!(parse("logout now").is_err());
    }

    #[test]
    fn test_script() {
        let results = parse_script("# setup\nlogout\n\nbogus\nmounted\n");

        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Ok(Command::Logout));
        assert!(results[1].is_err());
        assert_eq!(results[2], Ok(Command::Mounted));
    }
}
