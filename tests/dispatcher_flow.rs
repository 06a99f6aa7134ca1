//! Drives the whole dispatcher with JSON lines against a virtual screen.

use std::sync::Arc;
use std::time::Duration;

use command_bridge::{AgentSettings, Dispatcher};
use device_adapter::{EventKind, NodeSpec, ScreenFixture, VirtualScreen};
use serde_json::{json, Value};
use uiauto_agent::build_dispatcher;
use uiauto_core_types::{NodeFlag, Point, UiSelector};

fn login_screen() -> VirtualScreen {
    VirtualScreen::from_fixture(
        ScreenFixture::new(
            NodeSpec::new("android.widget.FrameLayout")
                .bounds(0, 0, 1080, 1920)
                .child(
                    NodeSpec::new("android.widget.LinearLayout")
                        .bounds(0, 0, 1080, 600)
                        .child(
                            NodeSpec::new("android.widget.EditText")
                                .resource_id("com.example.login:id/user")
                                .hint("Username")
                                .bounds(40, 100, 1040, 200)
                                .flag(NodeFlag::Focusable, true)
                                .flag(NodeFlag::Focused, true),
                        )
                        .child(
                            NodeSpec::new("android.widget.EditText")
                                .resource_id("com.example.login:id/password")
                                .text("secret")
                                .bounds(40, 250, 1040, 350),
                        )
                        .child(
                            NodeSpec::new("android.widget.Button")
                                .resource_id("com.example.login:id/submit")
                                .text("Sign in")
                                .bounds(40, 400, 1040, 500)
                                .flag(NodeFlag::Clickable, true),
                        ),
                )
                .child(
                    NodeSpec::new("android.widget.ScrollView")
                        .bounds(0, 600, 1080, 1920)
                        .flag(NodeFlag::Scrollable, true)
                        .child(NodeSpec::new("android.widget.TextView").text("Terms"))
                        .child(NodeSpec::new("android.widget.TextView").text("Privacy").hidden()),
                ),
        )
        .with_package("com.example.login"),
    )
}

async fn dispatcher(screen: &VirtualScreen) -> Dispatcher {
    let settings = AgentSettings {
        app_package: Some("com.example.login".into()),
        ..AgentSettings::default()
    };
    build_dispatcher(Arc::new(screen.clone()), settings).await.unwrap()
}

async fn send(dispatcher: &Dispatcher, command: Value) -> Value {
    let envelope = dispatcher.dispatch_json(&command.to_string()).await.unwrap();
    serde_json::from_str(&envelope).unwrap()
}

async fn find_key(dispatcher: &Dispatcher, strategy: &str, selector: &str) -> String {
    let reply = send(
        dispatcher,
        json!({"action": "find", "params": {"strategy": strategy, "selector": selector}}),
    )
    .await;
    assert_eq!(reply["status"], 0, "find {strategy}={selector}: {reply}");
    reply["value"]["ELEMENT"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn login_form_round_trip() {
    let screen = login_screen();
    let dispatcher = dispatcher(&screen).await;

    let user = find_key(&dispatcher, "id", "user").await;
    let reply = send(
        &dispatcher,
        json!({"action": "element:setText", "elementId": user, "params": {"text": "ada"}}),
    )
    .await;
    assert_eq!(reply, json!({"status": 0, "value": true}));
    let reply = send(
        &dispatcher,
        json!({"action": "element:getText", "params": {"elementId": user}}),
    )
    .await;
    assert_eq!(reply["value"], "ada");

    // Every find mints a fresh key, even for a node already cached.
    let again = find_key(&dispatcher, "id", "com.example.login:id/user").await;
    assert_ne!(again, user);
    let reply = send(&dispatcher, json!({"action": "element:getText", "elementId": again})).await;
    assert_eq!(reply["value"], "ada");

    let submit = find_key(&dispatcher, "id", "submit").await;
    let reply = send(&dispatcher, json!({"action": "element:click", "elementId": submit})).await;
    assert_eq!(reply["status"], 0);
    assert_eq!(
        screen.events().last().map(|e| e.kind.clone()),
        Some(EventKind::Click(Point::new(540.0, 450.0)))
    );
}

#[tokio::test]
async fn status_codes_follow_the_wire_protocol() {
    let screen = login_screen();
    let dispatcher = dispatcher(&screen).await;

    let missing = send(
        &dispatcher,
        json!({"action": "find", "params": {"strategy": "id", "selector": "nothing"}}),
    )
    .await;
    assert_eq!(missing["status"], 7);

    let unsupported = send(
        &dispatcher,
        json!({"action": "find", "params": {"strategy": "css selector", "selector": "a"}}),
    )
    .await;
    assert_eq!(unsupported["status"], 32);
    assert_eq!(
        unsupported["value"],
        "Sorry, we don't support the 'css selector' locator strategy yet"
    );

    let unknown = send(&dispatcher, json!({"action": "element:submit"})).await;
    assert_eq!(unknown["status"], 9);

    let never_issued = send(&dispatcher, json!({"action": "element:getText", "elementId": "999"})).await;
    assert_eq!(never_issued["status"], 13);

    let offscreen = send(&dispatcher, json!({"action": "click", "params": {"x": 5000, "y": 10}})).await;
    assert_eq!(offscreen["status"], 29);

    let garbage = dispatcher.dispatch_json("{not json").await.unwrap();
    assert_eq!(serde_json::from_str::<Value>(&garbage).unwrap()["status"], 13);
}

#[tokio::test]
async fn removed_nodes_become_stale() {
    let screen = login_screen();
    let dispatcher = dispatcher(&screen).await;
    let submit = find_key(&dispatcher, "id", "submit").await;
    screen.remove_matching(&UiSelector::new().resource_id("com.example.login:id/submit"));
    let reply = send(&dispatcher, json!({"action": "element:click", "elementId": submit})).await;
    assert_eq!(reply["status"], 10);
}

#[tokio::test]
async fn xpath_and_scrolling() {
    let screen = login_screen();
    let dispatcher = dispatcher(&screen).await;
    let reply = send(
        &dispatcher,
        json!({"action": "find", "params": {
            "strategy": "xpath",
            "path": [{"node": "LinearLayout"}, {"node": "EditText", "index": 2}],
            "attr": "",
            "constraint": "",
            "multiple": false
        }}),
    )
    .await;
    assert_eq!(reply["status"], 0, "{reply}");
    let password = reply["value"]["ELEMENT"].as_str().unwrap().to_string();
    let text = send(&dispatcher, json!({"action": "element:getText", "elementId": password})).await;
    assert_eq!(text["value"], "secret");

    let scroller = find_key(&dispatcher, "class name", "android.widget.ScrollView").await;
    let reply = send(
        &dispatcher,
        json!({"action": "element:scrollTo", "elementId": scroller, "params": {"text": "Privacy"}}),
    )
    .await;
    assert_eq!(reply, json!({"status": 0, "value": true}));
    assert!(screen
        .events()
        .iter()
        .any(|e| e.kind == EventKind::Scroll { found: true }));
}

#[tokio::test(start_paused = true)]
async fn long_click_holds_for_the_requested_time() {
    let screen = login_screen();
    let dispatcher = dispatcher(&screen).await;
    let submit = find_key(&dispatcher, "id", "submit").await;
    let reply = send(
        &dispatcher,
        json!({"action": "element:touchLongClick", "elementId": submit, "params": {"duration": 1500}}),
    )
    .await;
    assert_eq!(reply["status"], 0);
    let events = screen.events();
    let down = events.iter().find(|e| matches!(e.kind, EventKind::Down(_))).unwrap();
    let up = events.iter().find(|e| matches!(e.kind, EventKind::Up(_))).unwrap();
    assert_eq!(down.kind, EventKind::Down(Point::new(540.0, 450.0)));
    assert!(up.at - down.at >= Duration::from_millis(1500));
}

#[tokio::test]
async fn clearing_a_hint_only_field_succeeds() {
    let screen = login_screen();
    let dispatcher = dispatcher(&screen).await;
    let user = find_key(&dispatcher, "id", "user").await;
    let reply = send(&dispatcher, json!({"action": "element:clear", "elementId": user})).await;
    assert_eq!(reply, json!({"status": 0, "value": true}));
}

#[tokio::test]
async fn lost_service_is_fatal() {
    let screen = login_screen();
    let dispatcher = dispatcher(&screen).await;
    screen.set_connected(false);
    let fatal = dispatcher
        .dispatch_json(&json!({"action": "getDeviceSize"}).to_string())
        .await
        .unwrap_err();
    assert!(fatal.to_string().contains("UiAutomationService not connected"));
}

#[tokio::test]
async fn lost_service_is_fatal_for_cached_elements() {
    let screen = login_screen();
    let dispatcher = dispatcher(&screen).await;
    let submit = find_key(&dispatcher, "id", "submit").await;
    screen.set_connected(false);
    for action in ["element:click", "element:getText"] {
        let fatal = dispatcher
            .dispatch_json(&json!({"action": action, "elementId": submit}).to_string())
            .await
            .unwrap_err();
        assert!(fatal.to_string().contains("UiAutomationService not connected"));
    }
    let fatal = dispatcher
        .dispatch_json(
            &json!({"action": "element:getAttribute", "elementId": submit, "params": {"attribute": "displayed"}})
                .to_string(),
        )
        .await
        .unwrap_err();
    assert!(fatal.to_string().contains("UiAutomationService not connected"));
}

#[tokio::test]
async fn unknown_attribute_is_a_caller_error() {
    let screen = login_screen();
    let dispatcher = dispatcher(&screen).await;
    let submit = find_key(&dispatcher, "id", "submit").await;
    let reply = send(
        &dispatcher,
        json!({"action": "element:getAttribute", "elementId": submit, "params": {"attribute": "colour"}}),
    )
    .await;
    assert_eq!(reply["status"], 13);
}
