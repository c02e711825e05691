//! Interactive line console for the reservation server.
//!
//! The console loads [`tablelink_config::Config`], opens a [`Session`], and
//! then multiplexes two sources on the calling thread: lines typed by the
//! operator and jobs posted by the session's router. Pushes routed to the
//! main screen print as `<< LINE`; awaited replies print as `<= LINE`.
//!
//! Typed lines are sent verbatim. A leading `?` waits for the reply on a
//! request thread, so pushes and typed input keep flowing meanwhile. `/quit`
//! (or end of input) logs out once outstanding requests have finished.

mod config;
mod errors;
mod input;

use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tablelink::{
    Command, DisconnectCause, HandlerKind, Message, PrefixHandler, Session, SessionBuilder,
    SessionError, TagPrefixes, UiContext, UiJob, telemetry,
};
use tracing::{debug, info, warn};

use config::{ConfigLoader, OrthoConfigLoader};
use errors::ConsoleError;
use input::ConsoleInput;

const CONSOLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::console");
const INPUT_THREAD_NAME: &str = "tablelink-input";
const REQUEST_THREAD_NAME: &str = "tablelink-request";

enum ConsoleEvent {
    Job(UiJob),
    Push(Message),
    Reply(Result<Message, SessionError>),
    Disconnected(DisconnectCause),
    Input(String),
    InputClosed,
    InputFailed(std::io::Error),
}

/// Runs queued UI jobs on the console thread.
struct ConsoleUi {
    events: Sender<ConsoleEvent>,
}

impl UiContext for ConsoleUi {
    fn post(&self, job: UiJob) {
        if self.events.send(ConsoleEvent::Job(job)).is_err() {
            debug!(target: CONSOLE_TARGET, "console stopped; job discarded");
        }
    }
}

/// Runs the console until the operator quits, input ends, or the server
/// drops the connection.
pub fn run<I, R, W, E>(args: I, input: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead + Send + 'static,
    W: Write,
    E: Write,
{
    run_with_loader(args, input, stdout, stderr, &OrthoConfigLoader)
}

fn run_with_loader<I, R, W, E, L>(
    args: I,
    input: R,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead + Send + 'static,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let result = loader
        .load(&args)
        .and_then(|config| Console::open(&config))
        .and_then(|console| console.drive(input, stdout, stderr));
    match result {
        Ok(code) => code,
        Err(error) => {
            let _ = writeln!(stderr, "tablelink: {error}");
            ExitCode::FAILURE
        }
    }
}

struct Console {
    session: Arc<Session>,
    events: Receiver<ConsoleEvent>,
    sender: Sender<ConsoleEvent>,
    requests: Vec<JoinHandle<()>>,
}

impl Console {
    fn open(config: &tablelink_config::Config) -> Result<Self, ConsoleError> {
        telemetry::initialise(config)?;
        let (sender, events) = mpsc::channel();

        let disconnects = sender.clone();
        let session = SessionBuilder::new(config.clone())
            .on_disconnect(move |cause| {
                let _ = disconnects.send(ConsoleEvent::Disconnected(cause.clone()));
            })
            .connect(Arc::new(ConsoleUi {
                events: sender.clone(),
            }))?;

        let pushes = sender.clone();
        session.router().register(
            HandlerKind::Main,
            Arc::new(PrefixHandler::new(
                TagPrefixes::any(),
                move |message: Message| {
                    let _ = pushes.send(ConsoleEvent::Push(message));
                },
            )),
        );
        info!(
            target: CONSOLE_TARGET,
            server = %config.server(),
            "console ready"
        );
        Ok(Self {
            session: Arc::new(session),
            events,
            sender,
            requests: Vec::new(),
        })
    }

    fn drive<R, W, E>(
        mut self,
        input: R,
        stdout: &mut W,
        stderr: &mut E,
    ) -> Result<ExitCode, ConsoleError>
    where
        R: BufRead + Send + 'static,
        W: Write,
        E: Write,
    {
        spawn_input_reader(input, self.sender.clone())?;

        while let Ok(event) = self.events.recv() {
            match event {
                ConsoleEvent::Job(job) => job(),
                ConsoleEvent::Push(message) => print_line(stdout, "<<", &message)?,
                ConsoleEvent::Reply(reply) => print_reply(reply, stdout, stderr)?,
                ConsoleEvent::Input(line) => {
                    if !self.handle_input(&line, stderr)? {
                        return self.finish(stdout, stderr);
                    }
                }
                ConsoleEvent::InputClosed => return self.finish(stdout, stderr),
                ConsoleEvent::InputFailed(error) => {
                    self.finish(stdout, stderr)?;
                    return Err(ConsoleError::ReadInput(error));
                }
                ConsoleEvent::Disconnected(cause) => {
                    writeln!(stderr, "tablelink: connection lost: {cause}")
                        .map_err(ConsoleError::WriteOutput)?;
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        self.finish(stdout, stderr)
    }

    /// Executes one typed line. Returns `false` when the operator quits.
    fn handle_input<E: Write>(&mut self, line: &str, stderr: &mut E) -> Result<bool, ConsoleError> {
        let outcome = match ConsoleInput::parse(line) {
            Ok(ConsoleInput::Blank) => Ok(()),
            Ok(ConsoleInput::Quit) => return Ok(false),
            Ok(ConsoleInput::Send(command)) => self.session.send(&command).map_err(Into::into),
            Ok(ConsoleInput::Request(command)) => self.spawn_request(command),
            Err(error) => Err(ConsoleError::from(error)),
        };
        if let Err(error) = outcome {
            writeln!(stderr, "tablelink: {error}").map_err(ConsoleError::WriteOutput)?;
        }
        Ok(true)
    }

    /// Awaits the reply off the console thread; the result comes back as a
    /// [`ConsoleEvent::Reply`].
    fn spawn_request(&mut self, command: Command) -> Result<(), ConsoleError> {
        self.requests.retain(|handle| !handle.is_finished());
        let session = Arc::clone(&self.session);
        let replies = self.sender.clone();
        let handle = thread::Builder::new()
            .name(REQUEST_THREAD_NAME.to_owned())
            .spawn(move || {
                let reply = session.send_and_wait(&command);
                let _ = replies.send(ConsoleEvent::Reply(reply));
            })
            .map_err(ConsoleError::SpawnRequest)?;
        self.requests.push(handle);
        Ok(())
    }

    /// Waits for outstanding requests, logs out, then prints any replies and
    /// pushes that arrived before the connection closed.
    fn finish<W, E>(&mut self, stdout: &mut W, stderr: &mut E) -> Result<ExitCode, ConsoleError>
    where
        W: Write,
        E: Write,
    {
        for handle in self.requests.drain(..) {
            if handle.join().is_err() {
                warn!(target: CONSOLE_TARGET, "request thread panicked");
            }
        }
        let logout = self.session.logout();
        while let Ok(event) = self.events.try_recv() {
            match event {
                ConsoleEvent::Job(job) => job(),
                ConsoleEvent::Push(message) => print_line(stdout, "<<", &message)?,
                ConsoleEvent::Reply(reply) => print_reply(reply, stdout, stderr)?,
                ConsoleEvent::Input(_)
                | ConsoleEvent::InputClosed
                | ConsoleEvent::InputFailed(_)
                | ConsoleEvent::Disconnected(_) => {}
            }
        }
        logout?;
        Ok(ExitCode::SUCCESS)
    }
}

fn print_line<W: Write>(
    stdout: &mut W,
    marker: &str,
    message: &Message,
) -> Result<(), ConsoleError> {
    writeln!(stdout, "{marker} {}", message.to_line()).map_err(ConsoleError::WriteOutput)
}

fn print_reply<W, E>(
    reply: Result<Message, SessionError>,
    stdout: &mut W,
    stderr: &mut E,
) -> Result<(), ConsoleError>
where
    W: Write,
    E: Write,
{
    match reply {
        Ok(message) => print_line(stdout, "<=", &message),
        Err(error) => writeln!(stderr, "tablelink: {error}").map_err(ConsoleError::WriteOutput),
    }
}

fn spawn_input_reader<R>(input: R, events: Sender<ConsoleEvent>) -> Result<(), ConsoleError>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name(INPUT_THREAD_NAME.to_owned())
        .spawn(move || {
            for line in input.lines() {
                let event = match line {
                    Ok(line) => ConsoleEvent::Input(line),
                    Err(error) => {
                        let _ = events.send(ConsoleEvent::InputFailed(error));
                        return;
                    }
                };
                if events.send(event).is_err() {
                    return;
                }
            }
            let _ = events.send(ConsoleEvent::InputClosed);
        })
        .map(drop)
        .map_err(ConsoleError::SpawnInput)
}
