use std::borrow::Cow;
use std::collections::BTreeSet;
use std::marker::PhantomData;

use anstyle::Style;
use chip8_emulator::runtime::Reg;
use clap::{Command, CommandFactory};
use rustyline::{
    completion::Completer,
    highlight::Highlighter,
    hint::Hinter,
    validate::{ValidationContext, ValidationResult, Validator},
    Context,
};
use rustyline_derive::Helper;

/// Rustyline helper for the debugger: completion, hints and prompt styling
#[derive(Helper, Debug)]
pub(crate) struct DebuggerHelper<T: CommandFactory> {
    app: PhantomData<T>,
}

impl<T: CommandFactory> DebuggerHelper<T> {
    pub fn new() -> Self {
        DebuggerHelper { app: PhantomData }
    }
}

/// Values which make sense for a positional argument, by argument name
fn argument_values(id: &str) -> Vec<String> {
    let registers = Reg::all().map(|reg| reg.to_string());
    match id {
        "register" => registers.collect(),
        "address" | "value" => registers.chain(["i".into(), "pc".into()]).collect(),
        "target" => registers
            .chain(["i", "pc", "dt", "st"].map(String::from))
            .collect(),
        "key" => (0..16).map(|key| format!("{key:x}")).collect(),
        _ => Vec::new(),
    }
}

/// Find the candidates for the last word of the input.
///
/// Returns the length of the word being completed and the sorted candidates.
fn suggest(command: &Command, input: &[String]) -> (usize, BTreeSet<String>) {
    match input {
        [head, tail @ ..] if !tail.is_empty() => {
            if let Some(sub) = command.find_subcommand(head) {
                return suggest(sub, tail);
            }

            // Not a subcommand, the words are positional arguments of this command
            let index = input.len() - 1;
            let Some(arg) = command.get_positionals().nth(index) else {
                return (0, BTreeSet::new());
            };
            let last = &input[index];
            let candidates = argument_values(arg.get_id().as_str())
                .into_iter()
                .filter(|value| value.starts_with(last.as_str()))
                .collect();
            (last.len(), candidates)
        }

        [last] => {
            let mut candidates: BTreeSet<String> = command
                .get_subcommands()
                .flat_map(|cmd| {
                    std::iter::once(cmd.get_name().to_string())
                        .chain(cmd.get_visible_aliases().map(ToString::to_string))
                })
                .collect();

            // Commands with subcommands also get a `help` command
            if command.has_subcommands() {
                candidates.insert("help".to_string());
            }

            if let Some(arg) = command.get_positionals().next() {
                candidates.extend(argument_values(arg.get_id().as_str()));
            }

            candidates.retain(|candidate| candidate.starts_with(last.as_str()));
            (last.len(), candidates)
        }

        _ => (0, BTreeSet::new()),
    }
}

/// Split the line up to the cursor in words. A trailing space starts a new empty word.
fn words_before(line: &str, pos: usize) -> Option<Vec<String>> {
    let line = line.get(..pos)?;
    let mut words = shell_words::split(line).ok()?;
    if line.is_empty() || line.ends_with([' ', '\t']) {
        words.push(String::new());
    }
    Some(words)
}

impl<T: CommandFactory> Completer for DebuggerHelper<T> {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let Some(words) = words_before(line, pos) else {
            return Ok((0, Vec::new()));
        };

        let (offset, candidates) = suggest(&T::command(), &words);
        Ok((pos - offset, candidates.into_iter().collect()))
    }
}

impl<T: CommandFactory> Highlighter for DebuggerHelper<T> {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        let style = Style::new().dimmed();
        Cow::Owned(format!("{}{hint}{}", style.render(), style.render_reset()))
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        let style = Style::new().bold();
        Cow::Owned(format!("{}{prompt}{}", style.render(), style.render_reset()))
    }
}

impl<T: CommandFactory> Hinter for DebuggerHelper<T> {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let words = words_before(line, pos)?;
        let (offset, candidates) = suggest(&T::command(), &words);

        // Only hint when there is no ambiguity
        if candidates.len() != 1 {
            return None;
        }
        let candidate = candidates.into_iter().next()?;
        candidate.get(offset..).map(ToString::to_string)
    }
}

impl<T: CommandFactory> Validator for DebuggerHelper<T> {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        if shell_words::split(ctx.input()).is_err() {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::interactive::Command as DebuggerCommand;

    fn candidates(line: &str) -> (usize, Vec<String>) {
        let words = words_before(line, line.len()).unwrap();
        let (offset, candidates) = suggest(&DebuggerCommand::command(), &words);
        (offset, candidates.into_iter().collect())
    }

    #[test]
    fn suggest_command_test() {
        assert_eq!(
            candidates("re"),
            (2, vec!["registers".to_string(), "release".to_string()])
        );
        assert_eq!(candidates("scr"), (3, vec!["screen".to_string()]));
        assert_eq!(candidates("zzz"), (3, Vec::new()));
    }

    #[test]
    fn suggest_argument_test() {
        assert_eq!(
            candidates("registers v"),
            (
                1,
                vec![
                    "v0", "v1", "v2", "v3", "v4", "v5", "v6", "v7", "v8", "v9", "va", "vb", "vc",
                    "vd", "ve", "vf"
                ]
                .into_iter()
                .map(String::from)
                .collect()
            )
        );
        assert_eq!(
            candidates("set p"),
            (1, vec!["pc".to_string()])
        );
        assert_eq!(
            candidates("info t"),
            (1, vec!["timers".to_string()])
        );
    }

    #[test]
    fn words_before_test() {
        assert_eq!(words_before("step 1", 4), Some(vec!["step".to_string()]));
        assert_eq!(
            words_before("step ", 5),
            Some(vec!["step".to_string(), String::new()])
        );
        assert_eq!(words_before("", 0), Some(vec![String::new()]));
        assert_eq!(words_before("set \"[i", 7), None);
    }
}
