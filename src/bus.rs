//! Synchronous mode notifications between the fuel gauge and the charger.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};
use heapless::Vec;

/// Mode codes published on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ModeCode {
    /// Derated charging while the battery is outside its normal temperature band.
    Reduced = 4,
    Normal = 5,
    /// A self-test is running. Other mode changes are held back until it ends.
    SelfTest = 12,
}

impl ModeCode {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            4 => Some(Self::Reduced),
            5 => Some(Self::Normal),
            12 => Some(Self::SelfTest),
            _ => None,
        }
    }
}

impl From<ModeCode> for u8 {
    fn from(code: ModeCode) -> u8 {
        code as u8
    }
}

pub trait ModeSubscriber {
    /// Called on the publisher's flow. Must not block.
    fn on_mode(&self, code: u8);
}

pub trait ModePublisher {
    fn publish(&self, code: u8);

    fn publish_mode(&self, mode: ModeCode) {
        self.publish(mode.into())
    }
}

impl<P: ModePublisher + ?Sized> ModePublisher for &P {
    fn publish(&self, code: u8) {
        (**self).publish(code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SubscriptionToken(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// All subscriber slots are taken.
    Full,
    UnknownToken,
}

struct Subscribers<'a, const N: usize> {
    next_token: u32,
    list: Vec<(SubscriptionToken, &'a dyn ModeSubscriber), N>,
}

/// Delivers each published code to every current subscriber, in
/// registration order, before `publish` returns.
pub struct ModeBus<'a, M: RawMutex, const N: usize> {
    subscribers: Mutex<M, RefCell<Subscribers<'a, N>>>,
}

impl<'a, M: RawMutex, const N: usize> ModeBus<'a, M, N> {
    pub const fn new() -> Self {
        Self {
            subscribers: Mutex::new(RefCell::new(Subscribers {
                next_token: 0,
                list: Vec::new(),
            })),
        }
    }

    pub fn subscribe(
        &self,
        subscriber: &'a dyn ModeSubscriber,
    ) -> Result<SubscriptionToken, BusError> {
        self.subscribers.lock(|subscribers| {
            let mut subscribers = subscribers.borrow_mut();

            let token = SubscriptionToken(subscribers.next_token);
            subscribers
                .list
                .push((token, subscriber))
                .map_err(|_| BusError::Full)?;
            subscribers.next_token = subscribers.next_token.wrapping_add(1);

            Ok(token)
        })
    }

    pub fn unsubscribe(&self, token: SubscriptionToken) -> Result<(), BusError> {
        self.subscribers.lock(|subscribers| {
            let mut subscribers = subscribers.borrow_mut();

            let position = subscribers
                .list
                .iter()
                .position(|(t, _)| *t == token)
                .ok_or(BusError::UnknownToken)?;
            subscribers.list.remove(position);

            Ok(())
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock(|subscribers| subscribers.borrow().list.len())
    }
}

impl<'a, M: RawMutex, const N: usize> Default for ModeBus<'a, M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, M: RawMutex, const N: usize> ModePublisher for ModeBus<'a, M, N> {
    fn publish(&self, code: u8) {
        // Handlers run outside the lock so they may (un)subscribe.
        let snapshot = self
            .subscribers
            .lock(|subscribers| subscribers.borrow().list.clone());

        trace!("Publishing mode {} to {} subscribers", code, snapshot.len());
        for (_, subscriber) in snapshot.iter() {
            subscriber.on_mode(code);
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use core::cell::RefCell;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    /// Records every published code.
    #[derive(Default)]
    pub struct RecordingPublisher {
        pub codes: RefCell<std::vec::Vec<u8>>,
    }

    impl ModePublisher for RecordingPublisher {
        fn publish(&self, code: u8) {
            self.codes.borrow_mut().push(code);
        }
    }

    impl RecordingPublisher {
        pub fn take(&self) -> std::vec::Vec<u8> {
            core::mem::take(&mut *self.codes.borrow_mut())
        }
    }

    #[derive(Default)]
    struct Recorder {
        codes: RefCell<std::vec::Vec<u8>>,
    }

    impl ModeSubscriber for Recorder {
        fn on_mode(&self, code: u8) {
            self.codes.borrow_mut().push(code);
        }
    }

    #[test]
    fn publish_reaches_every_subscriber() {
        let first = Recorder::default();
        let second = Recorder::default();
        let bus = ModeBus::<NoopRawMutex, 4>::new();

        bus.subscribe(&first).unwrap();
        bus.subscribe(&second).unwrap();
        bus.publish_mode(ModeCode::Reduced);
        bus.publish(7);

        assert_eq!(*first.codes.borrow(), [4, 7]);
        assert_eq!(*second.codes.borrow(), [4, 7]);
    }

    struct Tagged<'a> {
        tag: char,
        log: &'a RefCell<std::vec::Vec<(char, u8)>>,
    }

    impl ModeSubscriber for Tagged<'_> {
        fn on_mode(&self, code: u8) {
            self.log.borrow_mut().push((self.tag, code));
        }
    }

    #[test]
    fn delivery_follows_registration_order() {
        let log = RefCell::new(std::vec::Vec::new());
        let a = Tagged { tag: 'a', log: &log };
        let b = Tagged { tag: 'b', log: &log };
        let c = Tagged { tag: 'c', log: &log };
        let bus = ModeBus::<NoopRawMutex, 4>::new();

        bus.subscribe(&b).unwrap();
        let token = bus.subscribe(&a).unwrap();
        bus.subscribe(&c).unwrap();
        bus.publish_mode(ModeCode::Reduced);

        bus.unsubscribe(token).unwrap();
        bus.subscribe(&a).unwrap();
        bus.publish_mode(ModeCode::Normal);

        assert_eq!(
            *log.borrow(),
            [('b', 4), ('a', 4), ('c', 4), ('b', 5), ('c', 5), ('a', 5)]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let recorder = Recorder::default();
        let bus = ModeBus::<NoopRawMutex, 2>::new();

        let token = bus.subscribe(&recorder).unwrap();
        bus.publish_mode(ModeCode::Normal);
        bus.unsubscribe(token).unwrap();
        bus.publish_mode(ModeCode::Reduced);

        assert_eq!(*recorder.codes.borrow(), [5]);
        assert_eq!(bus.unsubscribe(token), Err(BusError::UnknownToken));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_table_is_bounded() {
        let recorder = Recorder::default();
        let bus = ModeBus::<NoopRawMutex, 1>::new();

        bus.subscribe(&recorder).unwrap();
        assert_eq!(bus.subscribe(&recorder), Err(BusError::Full));
    }

    #[test]
    fn publish_without_subscribers() {
        let bus = ModeBus::<NoopRawMutex, 1>::new();
        bus.publish_mode(ModeCode::SelfTest);
    }

    #[test]
    fn mode_code_lookup() {
        assert_eq!(ModeCode::from_code(12), Some(ModeCode::SelfTest));
        assert_eq!(ModeCode::from_code(0), None);
        assert_eq!(u8::from(ModeCode::Normal), 5);
    }
}
