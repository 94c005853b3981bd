//! Text presenter for interactive sessions, and the command-line parser that
//! feeds it.

use std::io::{self, Write};

use shared::{wire_id, AdminAction, QuestionKind};

use crate::controller::SessionRole;
use crate::error::InputError;
use crate::session::UserCommand;
use crate::sink::Presenter;
use crate::tally::{render_final_results, render_tally, TallyView};
use crate::view::{ViewState, ViewStatus};

/// Prints every rendered view as a block of text.
pub struct TerminalPresenter<W: Write> {
    out: W,
    role: SessionRole,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, role: SessionRole) -> Self {
        Self { out, role }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_view(&mut self, view: &ViewState) -> io::Result<()> {
        let out = &mut self.out;
        writeln!(out)?;
        writeln!(out, "== Status: {} ==", view.status.as_str().to_uppercase())?;

        match view.status {
            ViewStatus::Connecting => writeln!(out, "Connected to poll. Waiting for updates...")?,
            ViewStatus::Setup => writeln!(out, "Waiting for poll to start...")?,
            ViewStatus::Active | ViewStatus::Results => {
                if let Some(q) = &view.current_question {
                    writeln!(out, "{} ({})", q.text, kind_label(q.kind))?;
                    if view.status == ViewStatus::Active {
                        for option in &q.options {
                            writeln!(out, "  [{}] {}", option.id, option.text)?;
                        }
                    }
                }
                if let Some(tally) = &view.live_tally {
                    let options = view
                        .current_question
                        .as_ref()
                        .map(|q| q.options.as_slice())
                        .unwrap_or(&[]);
                    write_tally(out, &render_tally(tally, options))?;
                }
            }
            ViewStatus::Finished => {
                writeln!(out, "Poll has finished. Final results:")?;
                if let Some(final_results) = &view.final_results {
                    for block in render_final_results(final_results) {
                        writeln!(out, "# {}", block.text)?;
                        write_tally(out, &block.tally)?;
                    }
                }
            }
            ViewStatus::Disconnected => {
                writeln!(out, "Disconnected from poll. Please rejoin.")?
            }
        }

        if let Some(hint) = hint(view.status, self.role) {
            writeln!(out, "> {}", hint)?;
        }
        out.flush()
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render(&mut self, view: &ViewState) {
        if let Err(e) = self.write_view(view) {
            tracing::warn!(error = %e, "failed to render view");
        }
    }

    fn notify(&mut self, message: &str) {
        if let Err(e) = writeln!(self.out, "! {}", message).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "failed to print notification");
        }
    }
}

fn write_tally<W: Write>(out: &mut W, tally: &TallyView) -> io::Result<()> {
    writeln!(out, "Total votes: {}", tally.total)?;
    for row in &tally.rows {
        writeln!(
            out,
            "  {:<24} {:>4} votes ({:.1}%)",
            row.text, row.count, row.percentage
        )?;
    }
    Ok(())
}

fn kind_label(kind: QuestionKind) -> &'static str {
    match kind {
        QuestionKind::SingleSelect => "pick one",
        QuestionKind::MultiSelect => "pick any",
    }
}

/// Commands available in the current state, mirroring the control panel buttons.
fn hint(status: ViewStatus, role: SessionRole) -> Option<&'static str> {
    match (role, status) {
        (SessionRole::Voter, ViewStatus::Active) => Some("vote <option id> [<option id>...]"),
        (SessionRole::Admin, ViewStatus::Setup) => Some("start"),
        (SessionRole::Admin, ViewStatus::Active) => Some("next | results"),
        (SessionRole::Admin, ViewStatus::Results) => Some("next | done"),
        _ => None,
    }
}

/// Parse one line of user input. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<UserCommand>, InputError> {
    let mut words = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty());
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "vote" | "v" => UserCommand::Vote(
            words
                .map(|w| wire_id::parse(w).ok_or_else(|| InputError::InvalidOption(w.to_string())))
                .collect::<Result<_, _>>()?,
        ),
        "start" => UserCommand::Admin(AdminAction::Start),
        "next" => UserCommand::Admin(AdminAction::Next),
        "results" | "show" => UserCommand::Admin(AdminAction::ShowResults),
        "done" | "end" => UserCommand::Admin(AdminAction::Done),
        "quit" | "exit" => UserCommand::Quit,
        other => return Err(InputError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}
