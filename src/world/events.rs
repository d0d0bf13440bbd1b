use crossbeam_channel::{unbounded, Receiver, Sender};
use glam::Vec3;
use tracing::warn;

/// Input delivered by the host window. Event handlers only ever enqueue these;
/// the frame loop applies them at the start of the next frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed at viewport pixel coordinates.
    PointerClick { x: f32, y: f32 },
    /// Pointer moved to viewport pixel coordinates.
    PointerMove { x: f32, y: f32 },
    KeyPress(SceneKey),
    /// Spawn one particle at an explicit world position.
    Spawn(SpawnRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKey {
    ToggleGravity,
    ForceSpawn,
    ResetCamera,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnRequest {
    /// Anywhere inside the configured spawn bounds.
    Random,
    At(Vec3),
}

/// Cloneable, thread-safe producer side of the input queue.
#[derive(Debug, Clone)]
pub struct InputHandle {
    tx: Sender<InputEvent>,
}

impl InputHandle {
    /// Returns false once the queue's scene has been unmounted or dropped.
    pub fn push(&self, event: InputEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(_) => {
                warn!("Input event dropped, scene no longer accepts input: {:?}", event);
                false
            }
        }
    }

    pub fn click(&self, x: f32, y: f32) -> bool {
        self.push(InputEvent::PointerClick { x, y })
    }

    pub fn pointer_moved(&self, x: f32, y: f32) -> bool {
        self.push(InputEvent::PointerMove { x, y })
    }

    pub fn key(&self, key: SceneKey) -> bool {
        self.push(InputEvent::KeyPress(key))
    }

    pub fn spawn(&self, request: SpawnRequest) -> bool {
        self.push(InputEvent::Spawn(request))
    }
}

/// Consumer side, owned by the scene.
#[derive(Debug)]
pub struct InputQueue {
    tx: Sender<InputEvent>,
    rx: Receiver<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn handle(&self) -> InputHandle {
        InputHandle { tx: self.tx.clone() }
    }

    /// Everything queued so far, in arrival order.
    pub fn drain(&self) -> Vec<InputEvent> {
        self.rx.try_iter().collect()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_order_across_threads() {
        let queue = InputQueue::new();
        let handle = queue.handle();
        std::thread::spawn(move || {
            handle.click(1.0, 2.0);
            handle.key(SceneKey::ToggleGravity);
        })
        .join()
        .unwrap();
        assert_eq!(
            queue.drain(),
            vec![InputEvent::PointerClick { x: 1.0, y: 2.0 }, InputEvent::KeyPress(SceneKey::ToggleGravity)]
        );
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn push_fails_after_queue_is_dropped() {
        let queue = InputQueue::new();
        let handle = queue.handle();
        drop(queue);
        assert!(!handle.spawn(SpawnRequest::Random));
    }
}
