//! Tests for the run loop: resolution, built-in flags, exit codes

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use adjutant::{
    exitcode, AppInfo, CommandInfo, Executor, MultiCommandApp, RunContext, SingleCommandApp,
};

/// Cloneable in-memory sink, so a test can keep reading what the app wrote.
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("utf8 output")
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// What an executor observed during a run.
#[derive(Default)]
struct Capture {
    ctx: Option<RunContext>,
    arguments: Vec<String>,
    invocations: usize,
}

fn capturing_executor(capture: Rc<RefCell<Capture>>) -> Executor {
    Box::new(move |ctx, arguments, _out| {
        let mut capture = capture.borrow_mut();
        capture.ctx = Some(ctx.clone());
        capture.arguments = arguments.to_vec();
        capture.invocations += 1;
        Ok(())
    })
}

fn test_app_info() -> AppInfo {
    AppInfo {
        name: "test".to_string(),
        summary: "A test".to_string(),
        usage: "testing".to_string(),
        version: "vTest".to_string(),
    }
}

fn args(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|token| token.to_string()).collect()
}

#[test]
fn given_single_app_when_running_then_executor_gets_context_and_positionals() {
    adjutant::util::testing::init_test_setup();

    // Arrange
    let capture = Rc::new(RefCell::new(Capture::default()));
    let init_ran = Rc::new(RefCell::new(false));
    let mut app = SingleCommandApp::new(
        test_app_info(),
        capturing_executor(capture.clone()),
        None,
        std::io::sink(),
        std::io::sink(),
    );
    let init_flag = init_ran.clone();
    app.on_init(move || {
        *init_flag.borrow_mut() = true;
        Ok(())
    });

    // Act
    let ctx = RunContext::new();
    let exit_code = app.run(&ctx, &args(&["testarg1", "testarg2"]));

    // Assert
    assert_eq!(exit_code, exitcode::OK);
    assert!(*init_ran.borrow());
    let capture = capture.borrow();
    assert_eq!(capture.arguments, args(&["testarg1", "testarg2"]));
    assert_eq!(capture.invocations, 1);

    // The executor saw the same cancellation chain that was passed in.
    ctx.cancel();
    assert!(capture.ctx.as_ref().expect("captured context").is_cancelled());
}

#[test]
fn given_single_app_when_executor_writes_then_output_lands_on_out_sink() {
    let out = SharedBuf::default();
    let mut app = SingleCommandApp::new(
        test_app_info(),
        Box::new(|_ctx, _arguments, out| {
            writeln!(out, "did the work")?;
            Ok(())
        }),
        None,
        out.clone(),
        std::io::sink(),
    );

    let exit_code = app.run(&RunContext::new(), &[]);

    assert_eq!(exit_code, exitcode::OK);
    assert_eq!(out.contents(), "did the work\n");
}

#[test]
fn given_help_flag_when_running_then_help_printed_and_executor_skipped() {
    let out = SharedBuf::default();
    let capture = Rc::new(RefCell::new(Capture::default()));
    let mut app = SingleCommandApp::new(
        test_app_info(),
        capturing_executor(capture.clone()),
        None,
        out.clone(),
        std::io::sink(),
    );

    let exit_code = app.run(&RunContext::new(), &args(&["--help"]));

    assert_eq!(exit_code, exitcode::OK);
    assert!(out.contents().starts_with("Usage: test testing\n"));
    assert!(out.contents().contains("Options:"));
    assert_eq!(capture.borrow().invocations, 0);
}

#[test]
fn given_version_flag_when_running_then_version_printed_and_executor_skipped() {
    let out = SharedBuf::default();
    let capture = Rc::new(RefCell::new(Capture::default()));
    let mut app = SingleCommandApp::new(
        test_app_info(),
        capturing_executor(capture.clone()),
        None,
        out.clone(),
        std::io::sink(),
    );

    let exit_code = app.run(&RunContext::new(), &args(&["--version"]));

    assert_eq!(exit_code, exitcode::OK);
    assert!(out.contents().starts_with("test vTest ("));
    assert_eq!(capture.borrow().invocations, 0);
}

#[test]
fn given_help_and_version_flags_when_running_then_help_takes_precedence() {
    let out = SharedBuf::default();
    let capture = Rc::new(RefCell::new(Capture::default()));
    let mut app = SingleCommandApp::new(
        test_app_info(),
        capturing_executor(capture.clone()),
        None,
        out.clone(),
        std::io::sink(),
    );

    let exit_code = app.run(&RunContext::new(), &args(&["--help", "--version"]));

    assert_eq!(exit_code, exitcode::OK);
    assert!(out.contents().starts_with("Usage: test testing\n"));
    assert_eq!(capture.borrow().invocations, 0);
}

#[test]
fn given_failing_init_hook_when_running_then_software_exit_and_no_resolution() {
    let err = SharedBuf::default();
    let capture = Rc::new(RefCell::new(Capture::default()));
    let mut app = SingleCommandApp::new(
        test_app_info(),
        capturing_executor(capture.clone()),
        None,
        std::io::sink(),
        err.clone(),
    );
    app.on_init(|| Err(anyhow::anyhow!("init hook failed")));

    let exit_code = app.run(&RunContext::new(), &[]);

    assert_eq!(exit_code, exitcode::SOFTWARE);
    assert_eq!(err.contents(), "init hook failed\n");
    assert_eq!(capture.borrow().invocations, 0);
}

#[test]
fn given_replaced_init_hook_when_running_then_only_latest_hook_invoked() {
    let first_ran = Rc::new(RefCell::new(false));
    let second_ran = Rc::new(RefCell::new(false));
    let mut app = SingleCommandApp::new(
        test_app_info(),
        Box::new(|_ctx, _arguments, _out| Ok(())),
        None,
        std::io::sink(),
        std::io::sink(),
    );

    let flag = first_ran.clone();
    app.on_init(move || {
        *flag.borrow_mut() = true;
        Ok(())
    });
    let flag = second_ran.clone();
    app.on_init(move || {
        *flag.borrow_mut() = true;
        Ok(())
    });

    app.run(&RunContext::new(), &[]);

    assert!(!*first_ran.borrow());
    assert!(*second_ran.borrow());
}

#[test]
fn given_failing_executor_when_running_then_message_on_err_sink_and_software_exit() {
    let err = SharedBuf::default();
    let mut app = SingleCommandApp::new(
        test_app_info(),
        Box::new(|_ctx, _arguments, _out| Err(anyhow::anyhow!("boom"))),
        None,
        std::io::sink(),
        err.clone(),
    );

    let exit_code = app.run(&RunContext::new(), &[]);

    assert_eq!(exit_code, exitcode::SOFTWARE);
    assert_eq!(err.contents(), "boom\n");
}

#[test]
fn given_unknown_flag_when_running_then_usage_exit_and_parse_error_reported() {
    let err = SharedBuf::default();
    let capture = Rc::new(RefCell::new(Capture::default()));
    let mut app = SingleCommandApp::new(
        test_app_info(),
        capturing_executor(capture.clone()),
        None,
        std::io::sink(),
        err.clone(),
    );

    let exit_code = app.run(&RunContext::new(), &args(&["--bogus"]));

    assert_eq!(exit_code, exitcode::USAGE);
    assert!(!err.contents().is_empty());
    assert_eq!(capture.borrow().invocations, 0);
}

#[test]
fn given_multi_app_when_running_registered_command_then_executor_gets_remaining_args() {
    let capture = Rc::new(RefCell::new(Capture::default()));
    let mut app = MultiCommandApp::new(test_app_info(), None, std::io::sink(), std::io::sink());
    app.set_command(
        CommandInfo {
            name: "testcommand".to_string(),
            ..Default::default()
        },
        Some(capturing_executor(capture.clone())),
        None,
    )
    .expect("register command");

    let ctx = RunContext::new();
    let exit_code = app.run(&ctx, &args(&["testcommand", "a", "b"]));

    assert_eq!(exit_code, exitcode::OK);
    let capture = capture.borrow();
    assert_eq!(capture.arguments, args(&["a", "b"]));
    assert_eq!(capture.invocations, 1);
    ctx.cancel();
    assert!(capture.ctx.as_ref().expect("captured context").is_cancelled());
}

#[test]
fn given_multi_app_when_running_without_arguments_then_help_printed_and_usage_exit() {
    let out = SharedBuf::default();
    let capture = Rc::new(RefCell::new(Capture::default()));
    let mut app = MultiCommandApp::new(test_app_info(), None, out.clone(), std::io::sink());
    app.set_command(
        CommandInfo {
            name: "testcommand".to_string(),
            summary: "A test command".to_string(),
            ..Default::default()
        },
        Some(capturing_executor(capture.clone())),
        None,
    )
    .expect("register command");

    let exit_code = app.run(&RunContext::new(), &[]);

    assert_eq!(exit_code, exitcode::USAGE);
    assert!(out.contents().starts_with("Usage: test testing\n"));
    assert!(out.contents().contains("\ttestcommand\tA test command\n"));
    assert_eq!(capture.borrow().invocations, 0);
}

#[test]
fn given_multi_app_when_first_token_matches_no_command_then_help_printed_and_usage_exit() {
    let out = SharedBuf::default();
    let capture = Rc::new(RefCell::new(Capture::default()));
    let mut app = MultiCommandApp::new(test_app_info(), None, out.clone(), std::io::sink());
    app.set_command(
        CommandInfo {
            name: "testcommand".to_string(),
            ..Default::default()
        },
        Some(capturing_executor(capture.clone())),
        None,
    )
    .expect("register command");

    // Exact match only; a prefix is not a command.
    let exit_code = app.run(&RunContext::new(), &args(&["testcomm"]));

    assert_eq!(exit_code, exitcode::USAGE);
    assert!(out.contents().starts_with("Usage: test testing\n"));
    assert_eq!(capture.borrow().invocations, 0);
}

#[test]
fn given_multi_app_when_running_command_with_help_flag_then_command_help_printed() {
    let out = SharedBuf::default();
    let capture = Rc::new(RefCell::new(Capture::default()));
    let mut app = MultiCommandApp::new(test_app_info(), None, out.clone(), std::io::sink());
    app.set_command(
        CommandInfo {
            name: "testcommand".to_string(),
            summary: "A test command".to_string(),
            usage: "args here...".to_string(),
        },
        Some(capturing_executor(capture.clone())),
        None,
    )
    .expect("register command");

    let exit_code = app.run(&RunContext::new(), &args(&["testcommand", "--help"]));

    assert_eq!(exit_code, exitcode::OK);
    assert!(out
        .contents()
        .starts_with("Usage: test testcommand args here...\n"));
    assert_eq!(capture.borrow().invocations, 0);
}

#[test]
fn given_help_only_command_when_running_it_then_command_help_printed_and_ok_exit() {
    let out = SharedBuf::default();
    let mut app = MultiCommandApp::new(test_app_info(), None, out.clone(), std::io::sink());
    app.set_command(
        CommandInfo {
            name: "docs".to_string(),
            summary: "Show documentation".to_string(),
            ..Default::default()
        },
        None,
        None,
    )
    .expect("register command");

    let exit_code = app.run(&RunContext::new(), &args(&["docs"]));

    assert_eq!(exit_code, exitcode::OK);
    assert!(out.contents().starts_with("Usage: test docs"));
    assert!(out.contents().contains("Show documentation"));
}

#[test]
fn given_multi_app_when_running_with_version_flag_then_version_printed() {
    let out = SharedBuf::default();
    let mut app = MultiCommandApp::new(test_app_info(), None, out.clone(), std::io::sink());

    let exit_code = app.run(&RunContext::new(), &args(&["--version"]));

    assert_eq!(exit_code, exitcode::OK);
    assert!(out.contents().starts_with("test vTest ("));
}

#[test]
fn given_multi_app_when_command_executor_fails_then_software_exit_and_message_reported() {
    let err = SharedBuf::default();
    let mut app = MultiCommandApp::new(test_app_info(), None, std::io::sink(), err.clone());
    app.set_command(
        CommandInfo {
            name: "failing".to_string(),
            ..Default::default()
        },
        Some(Box::new(|_ctx, _arguments, _out| {
            Err(anyhow::anyhow!("command failed"))
        })),
        None,
    )
    .expect("register command");

    let exit_code = app.run(&RunContext::new(), &args(&["failing"]));

    assert_eq!(exit_code, exitcode::SOFTWARE);
    assert_eq!(err.contents(), "command failed\n");
}
