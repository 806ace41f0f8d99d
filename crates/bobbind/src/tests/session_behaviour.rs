//! Behavioural tests for editor sessions served by the dispatcher.

use std::cell::RefCell;
use std::io::BufReader;
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

use crate::dispatch::{Dispatcher, Platform};
use crate::transport::test_utils::{ChannelReader, SharedBuffer, line};
use crate::transport::{Message, Session, TransportError};

use super::support::{Behaviour, PluginTemplate, StubLoader};

struct SessionWorld {
    dispatcher: Arc<Dispatcher<StubLoader>>,
    editor: Option<mpsc::Sender<Vec<u8>>>,
    output: SharedBuffer,
    session: Option<JoinHandle<Result<(), TransportError>>>,
    frames: Option<Vec<Message>>,
}

impl SessionWorld {
    fn start() -> Self {
        let dispatcher = Arc::new(Dispatcher::with_platform(
            StubLoader::default(),
            Platform::Posix,
        ));
        let (editor, reader) = ChannelReader::new();
        let output = SharedBuffer::default();
        let (session, client) = Session::new(BufReader::new(reader), output.clone());
        dispatcher.attach(Arc::new(client));
        let handler = Arc::clone(&dispatcher);
        let session = thread::spawn(move || session.run(handler));
        Self {
            dispatcher,
            editor: Some(editor),
            output,
            session: Some(session),
            frames: None,
        }
    }

    fn send(&self, value: &Value) {
        self.editor
            .as_ref()
            .expect("editor already disconnected")
            .send(line(value))
            .expect("session reader gone");
    }

    /// Disconnects the editor, waits for the session to end, and returns
    /// every frame the host wrote.
    fn finish(&mut self) -> &[Message] {
        if self.frames.is_none() {
            drop(self.editor.take());
            if let Some(session) = self.session.take() {
                session
                    .join()
                    .expect("session thread panicked")
                    .expect("session failed");
            }
            self.frames = Some(self.output.frames());
        }
        self.frames.as_deref().unwrap_or_default()
    }

    fn response(&mut self, msgid: u64) -> (Value, Value) {
        let matching: Vec<(Value, Value)> = self
            .finish()
            .iter()
            .filter_map(|frame| match frame {
                Message::Response {
                    msgid: id,
                    error,
                    result,
                } if *id == msgid => Some((error.clone(), result.clone())),
                _ => None,
            })
            .collect();
        match matching.as_slice() {
            [single] => single.clone(),
            other => panic!("expected one response for {msgid}, got {other:?}"),
        }
    }

    fn result(&mut self, msgid: u64) -> Value {
        let (error, result) = self.response(msgid);
        assert_eq!(error, Value::Null, "request {msgid} failed");
        result
    }
}

impl Drop for SessionWorld {
    fn drop(&mut self) {
        drop(self.editor.take());
        if let Some(session) = self.session.take() {
            drop(session.join());
        }
    }
}

#[fixture]
fn world() -> RefCell<SessionWorld> {
    RefCell::new(SessionWorld::start())
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

fn register(world: &RefCell<SessionWorld>, filename: &str, behaviour: Behaviour) {
    world
        .borrow()
        .dispatcher
        .cache()
        .loader()
        .register(strip_quotes(filename), PluginTemplate::cached(behaviour));
}

#[given("a host session with plugin {filename} that echoes its call")]
fn given_echo_plugin(world: &RefCell<SessionWorld>, filename: String) {
    register(world, &filename, Behaviour::Echo);
}

#[given("plugin {filename} that calls the editor")]
fn given_caller_plugin(world: &RefCell<SessionWorld>, filename: String) {
    register(world, &filename, Behaviour::CallEditor);
}

#[when("the editor sends request {msgid} {method}")]
fn when_request(world: &RefCell<SessionWorld>, msgid: u64, method: String) {
    world
        .borrow()
        .send(&json!([0, msgid, strip_quotes(&method), []]));
}

#[when("the editor asks for the specs of {filename} as request {msgid}")]
fn when_specs_requested(world: &RefCell<SessionWorld>, filename: String, msgid: u64) {
    world
        .borrow()
        .send(&json!([0, msgid, "specs", [strip_quotes(&filename)]]));
}

#[when("the editor sends notification {method}")]
fn when_notification(world: &RefCell<SessionWorld>, method: String) {
    world.borrow().send(&json!([2, strip_quotes(&method), []]));
}

#[when("the editor calls {method} as request {msgid} and answers the callback with {answer}")]
fn when_request_with_callback(
    world: &RefCell<SessionWorld>,
    method: String,
    msgid: u64,
    answer: i64,
) {
    let world = world.borrow();
    world.send(&json!([0, msgid, strip_quotes(&method), ["1 + 1"]]));
    let frames = world.output.wait_for_frames(1);
    let Some(Message::Request {
        msgid: callback_id,
        method: callback_method,
        ..
    }) = frames.first()
    else {
        panic!("expected the plugin to call the editor, got {frames:?}");
    };
    assert_eq!(callback_method, "nvim_eval");
    world.send(&json!([1, callback_id, null, answer]));
}

#[then("response {msgid} succeeds with {value}")]
fn then_succeeds_with(world: &RefCell<SessionWorld>, msgid: u64, value: String) {
    let expected = match value.as_str() {
        "null" => Value::Null,
        quoted if quoted.starts_with('"') => json!(strip_quotes(quoted)),
        other => serde_json::from_str(other).expect("literal JSON value"),
    };
    assert_eq!(world.borrow_mut().result(msgid), expected);
}

#[then("response {msgid} is an empty list")]
fn then_succeeds_with_empty_list(world: &RefCell<SessionWorld>, msgid: u64) {
    assert_eq!(world.borrow_mut().result(msgid), json!([]));
}

#[then("response {msgid} lists the spec {name}")]
fn then_lists_spec(world: &RefCell<SessionWorld>, msgid: u64, name: String) {
    let result = world.borrow_mut().result(msgid);
    let names: Vec<&str> = result
        .as_array()
        .expect("specs array")
        .iter()
        .filter_map(|spec| spec.get("name").and_then(Value::as_str))
        .collect();
    assert_eq!(names, vec![strip_quotes(&name)]);
}

#[then("response {msgid} echoes the procedure {procedure}")]
fn then_succeeds_with_procedure(world: &RefCell<SessionWorld>, msgid: u64, procedure: String) {
    let result = world.borrow_mut().result(msgid);
    assert_eq!(result.get("procedure"), Some(&json!(strip_quotes(&procedure))));
}

#[then("response {msgid} fails with {message}")]
fn then_fails_with(world: &RefCell<SessionWorld>, msgid: u64, message: String) {
    let (error, result) = world.borrow_mut().response(msgid);
    assert_eq!(error, json!(strip_quotes(&message)));
    assert_eq!(result, Value::Null);
}

#[then("the editor receives no frames")]
fn then_no_frames(world: &RefCell<SessionWorld>) {
    let mut world = world.borrow_mut();
    assert!(world.finish().is_empty(), "unexpected frames");
}

#[scenario(path = "tests/features/host_session.feature")]
fn host_session(#[from(world)] world: RefCell<SessionWorld>) {
    drop(world);
}
