//! Interactive command loop.
//!
//! Reads one line at a time and runs it to completion before the next line
//! is read. Ctrl-C ends the loop with the farewell message, including while a
//! confirmation prompt is waiting for its answer.

use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, warn};

use crate::commands::{DbCommand, DbResult};
use crate::config::Config;
use crate::db::Database;
use crate::format::{self, FAREWELL, HELP_TEXT};
use crate::parser::parse_command;
use crate::storage::DocumentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// What waiting for the next line produced.
enum Input {
    Line(String),
    Closed,
    Interrupted,
}

pub struct Repl<S> {
    db: Database<S>,
    config: Config,
}

impl<S: DocumentStore> Repl<S> {
    pub fn new(db: Database<S>, config: Config) -> Self {
        Self { db, config }
    }

    /// Executes a parsed command and renders the outcome. Errors become a
    /// single `Error: ...` line.
    pub fn eval(&mut self, cmd: DbCommand) -> (String, Flow) {
        let name = cmd.name();
        let start = Instant::now();
        let result = self.db.execute(cmd);
        let elapsed = start.elapsed();
        debug!(command = name, elapsed_ms = elapsed.as_millis() as u64, "command finished");

        let (mut output, flow) = match result {
            Ok(DbResult::Exit) => (FAREWELL.to_string(), Flow::Exit),
            Ok(result) => (format::render(&result), Flow::Continue),
            Err(e) => (format!("Error: {e}"), Flow::Continue),
        };
        if self.config.timing && flow == Flow::Continue {
            output.push_str(&format!(
                "\nCommand {name} took {:.3} s.",
                elapsed.as_secs_f64()
            ));
        }
        (output, flow)
    }

    /// Interactive session on stdin.
    pub async fn run(&mut self, quiet: bool) -> Result<()> {
        if !quiet {
            println!("Record store is running. Data directory: {}", self.config.data_dir.display());
            println!("{HELP_TEXT}");
        }
        self.run_session(BufReader::new(tokio::io::stdin()), tokio::signal::ctrl_c())
            .await
    }

    /// Runs a single command line, reading a confirmation answer from stdin
    /// when one is needed.
    pub async fn run_command(&mut self, line: &str) -> Result<()> {
        self.run_command_with(line, BufReader::new(tokio::io::stdin()), tokio::signal::ctrl_c())
            .await
    }

    /// Reads and executes lines from `input` until `exit`, end of input or
    /// `interrupt` completes.
    pub async fn run_session<R, I>(&mut self, input: R, interrupt: I) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        I: Future<Output = io::Result<()>>,
    {
        let mut lines = input.lines();
        // One listener for the whole session, so no Ctrl-C falls between
        // two reads.
        tokio::pin!(interrupt);

        loop {
            prompt(&self.config.prompt)?;
            match next_input(&mut lines, &mut interrupt).await? {
                Input::Line(line) => {
                    if self.handle_line(&line, &mut lines, &mut interrupt).await? == Flow::Exit {
                        return Ok(());
                    }
                }
                Input::Closed | Input::Interrupted => {
                    println!("\n{FAREWELL}");
                    return Ok(());
                }
            }
        }
    }

    pub async fn run_command_with<R, I>(&mut self, line: &str, input: R, interrupt: I) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        I: Future<Output = io::Result<()>>,
    {
        let mut lines = input.lines();
        tokio::pin!(interrupt);
        self.handle_line(line, &mut lines, &mut interrupt).await?;
        Ok(())
    }

    /// Parses, confirms if needed, executes and prints one line.
    async fn handle_line<R, I>(
        &mut self,
        line: &str,
        lines: &mut Lines<R>,
        interrupt: &mut Pin<&mut I>,
    ) -> Result<Flow>
    where
        R: AsyncBufRead + Unpin,
        I: Future<Output = io::Result<()>>,
    {
        let cmd = match parse_command(line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return Ok(Flow::Continue),
            Err(e) => {
                println!("Error: {e}");
                return Ok(Flow::Continue);
            }
        };

        if self.config.confirm_destructive && cmd.is_destructive() {
            prompt(&format!(
                "Are you sure you want to run \"{}\"? [y/n]: ",
                cmd.name()
            ))?;
            match next_input(lines, interrupt).await? {
                Input::Line(answer) if is_yes(&answer) => {}
                Input::Line(_) | Input::Closed => {
                    println!("Operation cancelled.");
                    return Ok(Flow::Continue);
                }
                Input::Interrupted => {
                    println!("\n{FAREWELL}");
                    return Ok(Flow::Exit);
                }
            }
        }

        let (output, flow) = self.eval(cmd);
        println!("{output}");
        Ok(flow)
    }
}

async fn next_input<R, I>(lines: &mut Lines<R>, interrupt: &mut Pin<&mut I>) -> Result<Input>
where
    R: AsyncBufRead + Unpin,
    I: Future<Output = io::Result<()>>,
{
    tokio::select! {
        line = lines.next_line() => {
            let line = line.context("failed to read input")?;
            Ok(line.map_or(Input::Closed, Input::Line))
        }
        signal = interrupt.as_mut() => {
            if let Err(e) = signal {
                warn!(error = %e, "interrupt listener failed");
            }
            Ok(Input::Interrupted)
        }
    }
}

fn prompt(text: &str) -> Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{text}")?;
    stdout.flush().context("failed to flush stdout")
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

#[cfg(test)]
mod tests {
    use std::future;
    use std::time::Duration;

    use super::*;
    use crate::storage::MemoryStore;

    fn repl(config: Config) -> Repl<MemoryStore> {
        Repl::new(Database::new(MemoryStore::default()), config)
    }

    fn confirming() -> Repl<MemoryStore> {
        repl(Config {
            confirm_destructive: true,
            ..Config::default()
        })
    }

    fn eval_line(repl: &mut Repl<MemoryStore>, line: &str) -> (String, Flow) {
        let cmd = parse_command(line).unwrap().expect("non-empty command");
        repl.eval(cmd)
    }

    fn row_count(repl: &Repl<MemoryStore>, table: &str) -> usize {
        repl.db.store().tables.get(table).map_or(0, Vec::len)
    }

    fn never() -> future::Pending<io::Result<()>> {
        future::pending()
    }

    fn interrupted() -> future::Ready<io::Result<()>> {
        future::ready(Ok(()))
    }

    async fn session(repl: &mut Repl<MemoryStore>, script: &str) {
        repl.run_session(script.as_bytes(), never()).await.unwrap();
    }

    #[test]
    fn test_eval_renders_results_and_errors() {
        let mut repl = repl(Config::default());

        let (out, flow) = eval_line(&mut repl, "create_table users name:str age:int");
        assert_eq!(flow, Flow::Continue);
        assert_eq!(
            out,
            "Table \"users\" created with columns: ID:int, name:str, age:int"
        );

        let (out, _) = eval_line(&mut repl, "insert into users values (\"Alice\", 30)");
        assert_eq!(out, "Record with ID=1 added to table \"users\".");

        let (out, _) = eval_line(&mut repl, "insert into users values (\"Bob\")");
        assert_eq!(out, "Error: expected 2 values, got 1");

        let (out, _) = eval_line(&mut repl, "select from users where name = Nobody");
        assert_eq!(out, "No records found.");
    }

    #[test]
    fn test_exit_stops_the_loop() {
        let mut repl = repl(Config::default());
        let (out, flow) = eval_line(&mut repl, "EXIT");
        assert_eq!(flow, Flow::Exit);
        assert_eq!(out, FAREWELL);
    }

    #[test]
    fn test_timing_line() {
        let mut repl = repl(Config {
            timing: true,
            ..Config::default()
        });
        let (out, _) = eval_line(&mut repl, "list_tables");
        assert!(out.starts_with("No tables created.\nCommand list_tables took "));
        assert!(out.ends_with(" s."));
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" Y \n"));
        assert!(!is_yes("yes"));
        assert!(!is_yes(""));
    }

    #[tokio::test]
    async fn test_session_runs_until_end_of_input() {
        let mut repl = repl(Config::default());
        session(
            &mut repl,
            "create_table t v:int\n\nbogus\ninsert into t values (1)\ninsert into t values (2)\n",
        )
        .await;
        assert_eq!(row_count(&repl, "t"), 2);
    }

    #[tokio::test]
    async fn test_session_stops_at_exit() {
        let mut repl = repl(Config::default());
        session(&mut repl, "create_table t v:int\nexit\ninsert into t values (1)\n").await;
        assert_eq!(row_count(&repl, "t"), 0);
    }

    #[tokio::test]
    async fn test_confirm_cancel_leaves_rows() {
        let mut repl = confirming();
        session(
            &mut repl,
            "create_table t v:int\ninsert into t values (1)\ndelete from t\nn\ndrop_table t\nyes\n",
        )
        .await;
        assert_eq!(row_count(&repl, "t"), 1);
        assert_eq!(repl.db.store().registry.list_tables(), vec!["t"]);
    }

    #[tokio::test]
    async fn test_confirm_yes_deletes() {
        let mut repl = confirming();
        session(
            &mut repl,
            "create_table t v:int\ninsert into t values (1)\ndelete from t\nY\n",
        )
        .await;
        assert_eq!(row_count(&repl, "t"), 0);
    }

    #[tokio::test]
    async fn test_confirm_cancelled_by_end_of_input() {
        let mut repl = confirming();
        session(&mut repl, "create_table t v:int\ninsert into t values (1)\ndelete from t").await;
        assert_eq!(row_count(&repl, "t"), 1);
    }

    #[tokio::test]
    async fn test_single_command_asks_for_confirmation() {
        let mut repl = confirming();
        session(&mut repl, "create_table t v:int\ninsert into t values (1)\n").await;

        repl.run_command_with("delete from t", &b"n\n"[..], never())
            .await
            .unwrap();
        assert_eq!(row_count(&repl, "t"), 1);

        repl.run_command_with("delete from t", &b"y\n"[..], never())
            .await
            .unwrap();
        assert_eq!(row_count(&repl, "t"), 0);
    }

    #[tokio::test]
    async fn test_interrupt_ends_session_while_waiting_for_input() {
        let mut repl = repl(Config::default());
        // The writer half stays open, so the read never completes.
        let (_writer, reader) = tokio::io::duplex(64);

        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            repl.run_session(BufReader::new(reader), interrupted()),
        )
        .await;
        assert!(matches!(finished, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_interrupt_at_confirmation_prompt_cancels_command() {
        let mut repl = confirming();
        session(&mut repl, "create_table t v:int\ninsert into t values (1)\n").await;
        let (_writer, reader) = tokio::io::duplex(64);

        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            repl.run_command_with("delete from t", BufReader::new(reader), interrupted()),
        )
        .await;
        assert!(matches!(finished, Ok(Ok(()))));
        assert_eq!(row_count(&repl, "t"), 1);
    }
}
