//! Line-oriented input console.
//!
//! Stands in for a pointer and keyboard: each stdin line becomes one or
//! more [`InputEvent`]s in scene coordinates.
//!
//! | Line                      | Events                                  |
//! |---------------------------|-----------------------------------------|
//! | `tap X Y`                 | press + release at (X, Y)               |
//! | `swipe X1 Y1 X2 Y2`       | press, move, release                    |
//! | `key CODE`                | key release (USB HID usage ID)          |
//! | `menu` / `home` / `back`  | click on the soft key                   |
//! | `resize W H`              | view resize                             |
//! | `quit`                    | stop the mirror                         |

use fbmirror_core::{InputEvent, MirrorError, SceneLayout, ScenePoint, StatusEvent, VirtualKey};

/// Parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Input(Vec<InputEvent>),
    Quit,
}

/// Tracks the scene layout so soft keys can be clicked by name.
pub struct Console {
    layout: SceneLayout,
}

impl Console {
    pub fn new(layout: SceneLayout) -> Self {
        Self { layout }
    }

    /// Follow layout changes reported by the mirror.
    pub fn observe(&mut self, status: &StatusEvent) {
        match status {
            StatusEvent::GeometryChanged { layout, .. } | StatusEvent::LayoutChanged(layout) => {
                self.layout = layout.clone();
            }
            _ => {}
        }
    }

    pub fn parse(&self, line: &str) -> Result<ConsoleCommand, MirrorError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = words.split_first() else {
            return Ok(ConsoleCommand::Input(Vec::new()));
        };

        let events = match verb.to_ascii_lowercase().as_str() {
            "quit" | "exit" => return Ok(ConsoleCommand::Quit),
            "tap" => {
                let [x, y] = numbers::<2>(verb, args)?;
                let p = ScenePoint::new(x, y);
                vec![InputEvent::PointerPress(p), InputEvent::PointerRelease(p)]
            }
            "swipe" => {
                let [x1, y1, x2, y2] = numbers::<4>(verb, args)?;
                let to = ScenePoint::new(x2, y2);
                vec![
                    InputEvent::PointerPress(ScenePoint::new(x1, y1)),
                    InputEvent::PointerMove(to),
                    InputEvent::PointerRelease(to),
                ]
            }
            "key" => {
                let [code] = numbers::<1>(verb, args)?;
                vec![InputEvent::KeyRelease(code as u32)]
            }
            "resize" => {
                let [width, height] = numbers::<2>(verb, args)?;
                vec![InputEvent::Resize {
                    width: width as u32,
                    height: height as u32,
                }]
            }
            "menu" => self.soft_key(VirtualKey::Menu),
            "home" => self.soft_key(VirtualKey::Home),
            "back" => self.soft_key(VirtualKey::Back),
            other => return Err(MirrorError::Other(format!("unknown command `{other}`"))),
        };
        Ok(ConsoleCommand::Input(events))
    }

    fn soft_key(&self, key: VirtualKey) -> Vec<InputEvent> {
        let rect = self.layout.key_rect(key);
        let center = ScenePoint::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0);
        vec![
            InputEvent::PointerPress(center),
            InputEvent::PointerRelease(center),
        ]
    }
}

fn numbers<const N: usize>(verb: &str, args: &[&str]) -> Result<[f64; N], MirrorError> {
    if args.len() != N {
        return Err(MirrorError::Other(format!(
            "`{verb}` takes {N} numbers, got {}",
            args.len()
        )));
    }
    let mut out = [0.0; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| MirrorError::Other(format!("`{verb}`: bad number `{arg}`")))?;
    }
    Ok(out)
}
