use std::time::Duration;

use app_crawler::driver::action_driver::{ActionDriver, Bounds, NodeId, Timeouts};
use app_crawler::driver::bridge::{BridgeRequest, BridgeResponse, WireTimeouts};
use app_crawler::driver::error::{DriverError, tolerate};
use app_crawler::driver::simulated::SimAction;
use app_crawler::driver::timeouts::TimeoutOverride;

mod common;

use common::{apps, driver};

// =========================================================================
// Bounds
// =========================================================================

#[test]
fn bounds_parse_and_display() {
    let b: Bounds = "[216,702][864,1350]".parse().unwrap();
    assert_eq!(b, Bounds::new(216, 702, 864, 1350));
    assert_eq!(b.to_string(), "[216,702][864,1350]");

    let spaced: Bounds = " [0, 0][10, 20] ".parse().unwrap();
    assert_eq!(spaced, Bounds::new(0, 0, 10, 20));
}

#[test]
fn malformed_bounds_are_rejected() {
    assert!("216,702,864,1350".parse::<Bounds>().is_err());
    assert!("[216,702]".parse::<Bounds>().is_err());
    assert!("[a,702][864,1350]".parse::<Bounds>().is_err());
    assert!("[216;702][864,1350]".parse::<Bounds>().is_err());
}

// =========================================================================
// Errors
// =========================================================================

#[test]
fn only_disconnect_is_fatal() {
    assert!(DriverError::Disconnected("gone".into()).is_fatal());
    assert!(!DriverError::NotFound.is_fatal());
    assert!(!DriverError::Io("disk".into()).is_fatal());

    assert_eq!(tolerate(Ok::<_, DriverError>(3)).unwrap(), Some(3));
    assert_eq!(tolerate::<u8>(Err(DriverError::NotFound)).unwrap(), None);
    assert!(tolerate::<u8>(Err(DriverError::Disconnected("x".into()))).is_err());
}

// =========================================================================
// Bridge wire format
// =========================================================================

#[test]
fn bridge_requests_are_tagged_by_command() {
    let json = serde_json::to_value(BridgeRequest::Child { node: 3, index: 1 }).unwrap();
    assert_eq!(json, serde_json::json!({"cmd": "child", "node": 3, "index": 1}));

    let json = serde_json::to_value(BridgeRequest::Back).unwrap();
    assert_eq!(json, serde_json::json!({"cmd": "back"}));

    let json = serde_json::to_value(BridgeRequest::FindText { text: "Wi-Fi".into() }).unwrap();
    assert_eq!(json["cmd"], "find_text");
    assert_eq!(BridgeRequest::ScrollToBeginning { node: 1 }.name(), "scroll_to_beginning");
}

#[test]
fn bridge_timeouts_travel_as_milliseconds() {
    let timeouts = Timeouts {
        idle: Duration::from_millis(100),
        selector: Duration::from_millis(0),
        action: Duration::from_secs(2),
        scroll: Duration::from_millis(50),
    };
    let wire = WireTimeouts::from(timeouts);
    assert_eq!(wire.action_ms, 2000);
    assert_eq!(Timeouts::from(wire), timeouts);
}

#[test]
fn bridge_response_errors_map_to_driver_errors() {
    let not_found: BridgeResponse =
        serde_json::from_str(r#"{"ok":false,"error":"not_found"}"#).unwrap();
    assert!(matches!(not_found.check("tap"), Err(DriverError::NotFound)));

    let failed: BridgeResponse =
        serde_json::from_str(r#"{"ok":false,"error":"device busy"}"#).unwrap();
    match failed.check("tap") {
        Err(DriverError::Protocol { command, error }) => {
            assert_eq!(command, "tap");
            assert_eq!(error, "device busy");
        }
        other => panic!("unexpected: {:?}", other.map(|r| r.ok)),
    }

    let ok: BridgeResponse =
        serde_json::from_str(r#"{"ok":true,"bounds":{"left":1,"top":2,"right":3,"bottom":4}}"#)
            .unwrap();
    assert_eq!(ok.check("bounds").unwrap().bounds, Some(Bounds::new(1, 2, 3, 4)));
}

#[cfg(unix)]
mod bridge_process {
    use app_crawler::driver::action_driver::{ActionDriver, NodeId};
    use app_crawler::driver::bridge::BridgeDriver;
    use app_crawler::driver::error::DriverError;

    fn sh(script: &str) -> Result<BridgeDriver, DriverError> {
        BridgeDriver::launch_process("sh", &["-c".to_string(), script.to_string()])
    }

    #[test]
    fn bridge_answers_are_decoded() {
        let script = r#"
echo '{"ok":true,"ready":true}'
while read -r line; do
  case "$line" in
    *'"quit"'*) echo '{"ok":true}'; exit 0 ;;
    *'"root"'*) echo '{"ok":true,"node":7}' ;;
    *'"tap"'*) echo '{"ok":false,"error":"not_found"}' ;;
    *) echo '{"ok":true,"text":"android.widget.Button"}' ;;
  esac
done
"#;
        let mut bridge = sh(script).unwrap();

        assert_eq!(bridge.current_root().unwrap(), Some(NodeId(7)));
        assert_eq!(bridge.class_name(NodeId(7)).unwrap(), "android.widget.Button");
        assert!(matches!(bridge.tap(NodeId(7)), Err(DriverError::NotFound)));
        bridge.quit();
    }

    #[test]
    fn bridge_exit_is_a_disconnect() {
        let mut bridge = sh(r#"echo '{"ok":true,"ready":true}'"#).unwrap();
        let err = bridge.current_root().unwrap_err();
        assert!(err.is_fatal(), "expected disconnect, got {}", err);
    }

    #[test]
    fn missing_ready_signal_is_rejected() {
        assert!(sh(r#"echo '{"ok":true}'"#).is_err());
    }
}

// =========================================================================
// Timeout override
// =========================================================================

#[test]
fn override_restores_on_drop() {
    let mut d = driver(apps::FLAT);
    let original = d.timeouts().unwrap();
    {
        let mut guard = TimeoutOverride::zero(&mut d).unwrap();
        assert_eq!(guard.saved(), original);
        assert_eq!(guard.timeouts().unwrap(), Timeouts::ZERO);
    }
    assert_eq!(d.timeouts().unwrap(), original);
}

// =========================================================================
// Simulated driver
// =========================================================================

#[test]
fn simulated_taps_navigate_and_back_pops() {
    let mut d = driver(apps::NOTES);
    let settings = d.clickable(0).unwrap().unwrap();
    d.tap(settings).unwrap();
    assert_eq!(d.current_screen(), "settings");
    assert_eq!(d.foreground().unwrap().activity, ".SettingsActivity");

    // Handles from the previous screen are stale now
    assert!(matches!(d.text(settings), Err(DriverError::NotFound)));
    assert!(!d.exists(settings).unwrap());

    d.press_back().unwrap();
    assert_eq!(d.current_screen(), "home");
    assert!(d.exists(settings).unwrap());
}

#[test]
fn simulated_handles_are_stable() {
    let mut d = driver(apps::FLAT);
    let a = d.clickable(1).unwrap().unwrap();
    let root = d.current_root().unwrap().unwrap();
    let b = d.child(root, 1).unwrap().unwrap();
    assert_eq!(a, b);
    assert_eq!(d.child(root, 3).unwrap(), None);
    assert_eq!(d.child_count(root).unwrap(), Some(3));
}

#[test]
fn simulated_scroll_reveals_one_page_at_a_time() {
    let mut d = driver(apps::LIST);
    let list = d.scrollable(0).unwrap().unwrap();
    let first_row = |d: &mut app_crawler::driver::simulated::SimulatedDriver| {
        let row = d.child(list, 0).unwrap().unwrap();
        d.text(row).unwrap()
    };

    assert_eq!(first_row(&mut d), "A");
    assert!(d.scroll_forward(list).unwrap());
    assert_eq!(first_row(&mut d), "B");
    assert!(d.scroll_forward(list).unwrap());
    assert!(!d.scroll_forward(list).unwrap(), "already at the end");
    assert_eq!(first_row(&mut d), "C");

    d.scroll_to_beginning(list).unwrap();
    assert_eq!(first_row(&mut d), "A");

    // Hidden rows are still reachable by text
    assert!(d.find_by_text("C").unwrap().is_some());
    assert_eq!(d.find_by_text("Z").unwrap(), None);
}

#[test]
fn simulated_launch_checks_package_and_resets() {
    let mut d = driver(apps::NOTES);
    let settings = d.clickable(0).unwrap().unwrap();
    d.tap(settings).unwrap();

    assert!(d.launch("com.example.other", Duration::from_secs(1)).is_err());
    d.launch("com.example.notes", Duration::from_secs(1)).unwrap();
    assert_eq!(d.current_screen(), "home");
    assert_eq!(
        d.actions().last(),
        Some(&SimAction::Launch("com.example.notes".into()))
    );
}

#[test]
fn simulated_disconnect_after_taps() {
    let mut d = driver(apps::FLAT).disconnect_after_taps(1);
    let node = d.clickable(0).unwrap().unwrap();
    d.tap(node).unwrap();

    assert!(matches!(d.current_root(), Err(DriverError::Disconnected(_))));
    assert!(matches!(d.tap(NodeId(0)), Err(DriverError::Disconnected(_))));
    assert!(d.timeouts().is_ok());
}
