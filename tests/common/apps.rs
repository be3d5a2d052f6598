//! Scripted apps shared by the crawl tests.

/// Three buttons, none of which leads anywhere.
pub const FLAT: &str = r#"
package: com.example.flat
start: home
screens:
  home:
    activity: .MainActivity
    root:
      class: android.widget.FrameLayout
      children:
        - class: android.widget.Button
          description: One
          clickable: true
        - class: android.widget.Button
          description: Two
          clickable: true
        - class: android.widget.Button
          description: Three
          clickable: true
"#;

/// The first button opens a screen with the same shape under another
/// activity.
pub const CYCLE: &str = r#"
package: com.example.cycle
start: home
screens:
  home:
    activity: .HomeActivity
    root:
      class: android.widget.LinearLayout
      children:
        - class: android.widget.Button
          description: Mirror
          clickable: true
          on_tap: mirror
        - class: android.widget.Button
          description: Stay
          clickable: true
  mirror:
    activity: .MirrorActivity
    root:
      class: android.widget.LinearLayout
      children:
        - class: android.widget.Button
          description: Again
          clickable: true
          on_tap: home
        - class: android.widget.Button
          description: Other
          clickable: true
"#;

/// Two levels of navigation plus a compose screen with a text field whose
/// save button pops back to home.
pub const NOTES: &str = r#"
package: com.example.notes
start: home
screens:
  home:
    activity: .MainActivity
    root:
      class: android.widget.FrameLayout
      children:
        - class: android.widget.Button
          description: Settings
          clickable: true
          on_tap: settings
        - class: android.widget.Button
          description: Compose
          clickable: true
          on_tap: compose
  settings:
    activity: .SettingsActivity
    root:
      class: android.widget.LinearLayout
      children:
        - class: android.widget.TextView
          description: About
          clickable: true
          on_tap: about
  about:
    activity: .AboutActivity
    root:
      class: android.widget.RelativeLayout
      children:
        - class: android.widget.TextView
          text: Version 1.0
  compose:
    activity: .ComposeActivity
    root:
      class: android.widget.LinearLayout
      children:
        - class: android.widget.EditText
          description: Title
          clickable: true
        - class: android.widget.ImageButton
          description: Save
          clickable: true
          on_tap: "@back"
"#;

/// Exits into a foreign package, an ignored help panel and a window with
/// no inspectable root.
pub const EXITS: &str = r#"
package: com.example.exits
start: home
screens:
  home:
    activity: .MainActivity
    root:
      class: android.widget.FrameLayout
      children:
        - class: android.widget.Button
          description: Share
          clickable: true
          on_tap: chooser
        - class: android.widget.Button
          description: Help
          clickable: true
          on_tap: help
        - class: android.widget.Button
          description: Blank
          clickable: true
          on_tap: blank
  chooser:
    package: com.android.intentresolver
    activity: .ChooserActivity
    root:
      class: android.widget.ListView
      children:
        - class: android.widget.Button
          description: Mail
          clickable: true
  help:
    activity: Feedback & Help
    root:
      class: android.widget.ScrollView
      children:
        - class: android.widget.Button
          description: Contact us
          clickable: true
  blank:
    activity: .BlankActivity
"#;

/// Two screens that open each other forever.
pub const PING_PONG: &str = r#"
package: com.example.pingpong
start: ping
screens:
  ping:
    activity: .PingActivity
    root:
      class: android.widget.FrameLayout
      children:
        - class: android.widget.Button
          description: To pong
          clickable: true
          on_tap: pong
  pong:
    activity: .PongActivity
    root:
      class: android.widget.LinearLayout
      children:
        - class: android.widget.Button
          description: To ping
          clickable: true
          on_tap: ping
"#;

/// A list revealing one row per scroll.
pub const LIST: &str = r#"
package: com.example.list
start: rows
screens:
  rows:
    activity: .ListActivity
    root:
      class: android.widget.FrameLayout
      children:
        - class: android.widget.ListView
          scrollable: true
          page_size: 1
          children:
            - class: android.widget.TextView
              text: A
            - class: android.widget.TextView
              text: B
            - class: android.widget.TextView
              text: C
"#;

/// Deny-listed labels and rectangle next to an ordinary button.
pub const DENIED: &str = r#"
package: com.example.denied
start: home
screens:
  home:
    activity: .MainActivity
    root:
      class: android.widget.FrameLayout
      children:
        - class: android.widget.ImageButton
          description: Back
          clickable: true
        - class: android.widget.Button
          description: 在设置中搜索
          clickable: true
        - class: android.widget.Button
          description: Overlay
          bounds: "[216,702][864,1350]"
          clickable: true
        - class: android.widget.Button
          description: Keep
          bounds: "[0,0][100,100]"
          clickable: true
"#;

/// A node that is gone before it can be read and one that vanishes on tap.
pub const STALE: &str = r#"
package: com.example.stale
start: home
screens:
  home:
    activity: .MainActivity
    root:
      class: android.widget.FrameLayout
      children:
        - class: android.widget.Button
          description: Ghost
          clickable: true
          detached: true
        - class: android.widget.Button
          description: Flaky
          clickable: true
          vanishes_on_tap: true
        - class: android.widget.Button
          description: Solid
          clickable: true
          on_tap: next
  next:
    activity: .NextActivity
    root:
      class: android.widget.LinearLayout
      children:
        - class: android.widget.TextView
          text: Done
"#;

/// Root children wrap deeper content, so only a full walk tells
/// `first` and `second` apart.
pub const NESTED: &str = r#"
package: com.example.nested
start: first
screens:
  first:
    activity: .MainActivity
    root:
      class: android.widget.FrameLayout
      children:
        - class: android.widget.LinearLayout
          children:
            - class: android.widget.TextView
              text: Hello
  second:
    activity: .MainActivity
    root:
      class: android.widget.FrameLayout
      children:
        - class: android.widget.LinearLayout
          children:
            - class: android.widget.ImageView
"#;
