//! Remote entity actions
//!
//! A network thread decodes [`WireAction`]s and pushes typed
//! [`EntityAction`]s through a bounded queue; the entity drains the queue
//! without blocking once per input tick.
//!
//! | Code | Action |
//! |---|---|
//! | 0 | move forward |
//! | 1 | move left |
//! | 2 | move backward |
//! | 3 | move right |
//! | 4 | rotate left |
//! | 5 | rotate right |
//! | 6 | shoot |
//! | 7 | jump |
//! | 9 | apply state (13 floats) |
//!
//! Code 8 is reserved.

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::foundation::math::{utils, Quat, Quaternion, Vec3};

/// Version carried by every [`WireAction`]
pub const ACTION_PROTOCOL_VERSION: u16 = 1;

/// Floats in an apply-state payload
pub const STATE_PAYLOAD_LEN: usize = 13;

/// Action decoding and queue errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Code outside the table, including the reserved 8
    #[error("Unknown action code {0}")]
    UnknownCode(u8),

    /// Payload length does not match the code
    #[error("Action {code} expects {expected} payload values, got {found}")]
    PayloadLength {
        /// Action code
        code: u8,
        /// Required length
        expected: usize,
        /// Received length
        found: usize,
    },

    /// Sender speaks another protocol version
    #[error("Protocol version mismatch: expected {expected}, got {found}")]
    VersionMismatch {
        /// Our version
        expected: u16,
        /// Their version
        found: u16,
    },

    /// The bounded queue is full
    #[error("Action queue is full")]
    QueueFull,

    /// The other end of the queue was dropped
    #[error("Action queue disconnected")]
    Disconnected,
}

/// Full physical state of an entity's body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityState {
    /// World position
    pub position: Vec3,
    /// World orientation
    pub rotation: Quat,
    /// Linear velocity
    pub linear_velocity: Vec3,
    /// Angular velocity
    pub angular_velocity: Vec3,
}

impl EntityState {
    /// Position, rotation as x/y/z/w, linear velocity, angular velocity
    pub fn to_payload(&self) -> Vec<f32> {
        let q = self.rotation.quaternion();
        let mut payload = Vec::with_capacity(STATE_PAYLOAD_LEN);
        payload.extend_from_slice(self.position.as_slice());
        payload.extend_from_slice(&[q.i, q.j, q.k, q.w]);
        payload.extend_from_slice(self.linear_velocity.as_slice());
        payload.extend_from_slice(self.angular_velocity.as_slice());
        payload
    }

    /// Inverse of [`EntityState::to_payload`]; a zero rotation decodes as identity
    pub fn from_payload(payload: &[f32]) -> Result<Self, ActionError> {
        let p: &[f32; STATE_PAYLOAD_LEN] = payload.try_into().map_err(|_| ActionError::PayloadLength {
            code: APPLY_STATE,
            expected: STATE_PAYLOAD_LEN,
            found: payload.len(),
        })?;
        Ok(Self {
            position: Vec3::new(p[0], p[1], p[2]),
            rotation: utils::normalize_quaternion(Quaternion::new(p[6], p[3], p[4], p[5])),
            linear_velocity: Vec3::new(p[7], p[8], p[9]),
            angular_velocity: Vec3::new(p[10], p[11], p[12]),
        })
    }
}

const APPLY_STATE: u8 = 9;

/// Something a remote peer asks an entity to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityAction {
    /// Impulse along the entity's forward axis
    MoveForward,
    /// Impulse along the entity's left axis
    MoveLeft,
    /// Impulse along the entity's back axis
    MoveBackward,
    /// Impulse along the entity's right axis
    MoveRight,
    /// Torque about +Z
    RotateLeft,
    /// Torque about -Z
    RotateRight,
    /// Hit-scan shot along the forward axis
    Shoot,
    /// Jump, if grounded and off cooldown
    Jump,
    /// Overwrite the body's state
    ApplyState(EntityState),
}

impl EntityAction {
    /// Wire code
    pub fn code(&self) -> u8 {
        match self {
            Self::MoveForward => 0,
            Self::MoveLeft => 1,
            Self::MoveBackward => 2,
            Self::MoveRight => 3,
            Self::RotateLeft => 4,
            Self::RotateRight => 5,
            Self::Shoot => 6,
            Self::Jump => 7,
            Self::ApplyState(_) => APPLY_STATE,
        }
    }

    /// Encode for the wire at the current protocol version
    pub fn to_wire(&self) -> WireAction {
        let payload = match self {
            Self::ApplyState(state) => state.to_payload(),
            _ => Vec::new(),
        };
        WireAction {
            version: ACTION_PROTOCOL_VERSION,
            code: self.code(),
            payload,
        }
    }
}

impl TryFrom<&WireAction> for EntityAction {
    type Error = ActionError;

    fn try_from(wire: &WireAction) -> Result<Self, Self::Error> {
        if wire.version != ACTION_PROTOCOL_VERSION {
            return Err(ActionError::VersionMismatch {
                expected: ACTION_PROTOCOL_VERSION,
                found: wire.version,
            });
        }
        let simple = match wire.code {
            0 => Self::MoveForward,
            1 => Self::MoveLeft,
            2 => Self::MoveBackward,
            3 => Self::MoveRight,
            4 => Self::RotateLeft,
            5 => Self::RotateRight,
            6 => Self::Shoot,
            7 => Self::Jump,
            APPLY_STATE => return EntityState::from_payload(&wire.payload).map(Self::ApplyState),
            code => return Err(ActionError::UnknownCode(code)),
        };
        if !wire.payload.is_empty() {
            return Err(ActionError::PayloadLength {
                code: wire.code,
                expected: 0,
                found: wire.payload.len(),
            });
        }
        Ok(simple)
    }
}

/// Serialisable action record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAction {
    /// Protocol version of the sender
    pub version: u16,
    /// Action code
    pub code: u8,
    /// Floats carried by the action; empty for all but apply-state
    #[serde(default)]
    pub payload: Vec<f32>,
}

/// Producer half of an action queue; may live on another thread
#[derive(Debug, Clone)]
pub struct ActionSender {
    inner: SyncSender<EntityAction>,
}

impl ActionSender {
    /// Queue an action, blocking while the queue is full
    pub fn send(&self, action: EntityAction) -> Result<(), ActionError> {
        self.inner.send(action).map_err(|_| ActionError::Disconnected)
    }

    /// Queue an action without blocking
    pub fn try_send(&self, action: EntityAction) -> Result<(), ActionError> {
        self.inner.try_send(action).map_err(|error| match error {
            TrySendError::Full(_) => ActionError::QueueFull,
            TrySendError::Disconnected(_) => ActionError::Disconnected,
        })
    }

    /// Decode and queue a wire record without blocking
    pub fn try_send_wire(&self, wire: &WireAction) -> Result<(), ActionError> {
        self.try_send(EntityAction::try_from(wire)?)
    }
}

/// Consumer half of an action queue
#[derive(Debug)]
pub struct ActionReceiver {
    inner: Receiver<EntityAction>,
}

impl ActionReceiver {
    /// Every action queued so far, oldest first; never blocks
    pub fn drain(&self) -> Vec<EntityAction> {
        let mut actions = Vec::new();
        loop {
            match self.inner.try_recv() {
                Ok(action) => actions.push(action),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::trace!("Action queue producer gone");
                    break;
                }
            }
        }
        actions
    }
}

/// Bounded action queue holding at most `capacity` pending actions
pub fn action_channel(capacity: usize) -> (ActionSender, ActionReceiver) {
    let (sender, receiver) = mpsc::sync_channel(capacity);
    (ActionSender { inner: sender }, ActionReceiver { inner: receiver })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::thread;

    fn wire(code: u8, payload: Vec<f32>) -> WireAction {
        WireAction {
            version: ACTION_PROTOCOL_VERSION,
            code,
            payload,
        }
    }

    #[test]
    fn test_codes_match_table() {
        let actions = [
            EntityAction::MoveForward,
            EntityAction::MoveLeft,
            EntityAction::MoveBackward,
            EntityAction::MoveRight,
            EntityAction::RotateLeft,
            EntityAction::RotateRight,
            EntityAction::Shoot,
            EntityAction::Jump,
        ];
        for (expected, action) in actions.iter().enumerate() {
            assert_eq!(usize::from(action.code()), expected);
            assert_eq!(EntityAction::try_from(&action.to_wire()), Ok(*action));
        }
    }

    #[test]
    fn test_apply_state_layout() {
        let payload: Vec<f32> = vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let action = EntityAction::try_from(&wire(9, payload.clone())).unwrap();
        let EntityAction::ApplyState(state) = action else {
            panic!("expected apply-state, got {action:?}");
        };
        assert_eq!(state.position, Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(state.rotation, Quat::identity());
        assert_eq!(state.angular_velocity, Vec3::new(7.0, 8.0, 9.0));
        assert_eq!(state.to_payload(), payload);
    }

    #[test]
    fn test_rejects_malformed_records() {
        assert_eq!(EntityAction::try_from(&wire(8, Vec::new())), Err(ActionError::UnknownCode(8)));
        assert_eq!(EntityAction::try_from(&wire(42, Vec::new())), Err(ActionError::UnknownCode(42)));
        assert_eq!(
            EntityAction::try_from(&wire(9, vec![0.0; 12])),
            Err(ActionError::PayloadLength { code: 9, expected: 13, found: 12 })
        );
        assert_eq!(
            EntityAction::try_from(&wire(6, vec![1.0])),
            Err(ActionError::PayloadLength { code: 6, expected: 0, found: 1 })
        );
        let stale = WireAction { version: ACTION_PROTOCOL_VERSION + 1, ..wire(0, Vec::new()) };
        assert_eq!(
            EntityAction::try_from(&stale),
            Err(ActionError::VersionMismatch {
                expected: ACTION_PROTOCOL_VERSION,
                found: ACTION_PROTOCOL_VERSION + 1
            })
        );
    }

    #[test]
    fn test_wire_record_through_ron() {
        let text = ron::to_string(&EntityAction::Jump.to_wire()).unwrap();
        let decoded: WireAction = ron::from_str(&text).unwrap();
        assert_eq!(EntityAction::try_from(&decoded), Ok(EntityAction::Jump));
    }

    #[test]
    fn test_queue_is_bounded() {
        let (sender, receiver) = action_channel(2);
        sender.try_send(EntityAction::Shoot).unwrap();
        sender.try_send(EntityAction::Jump).unwrap();
        assert_eq!(sender.try_send(EntityAction::Shoot), Err(ActionError::QueueFull));

        assert_eq!(receiver.drain(), vec![EntityAction::Shoot, EntityAction::Jump]);
        assert!(receiver.drain().is_empty());
    }

    #[test]
    fn test_producer_on_another_thread() {
        let (sender, receiver) = action_channel(8);
        let producer = thread::spawn(move || {
            for code in [0, 3, 6] {
                sender.send(EntityAction::try_from(&wire(code, Vec::new())).unwrap()).unwrap();
            }
        });
        producer.join().unwrap();

        let actions = receiver.drain();
        assert_eq!(
            actions,
            vec![EntityAction::MoveForward, EntityAction::MoveRight, EntityAction::Shoot]
        );
    }
}
