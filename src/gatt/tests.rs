use std::sync::Arc;

use gattc_const::{Characteristic as C, Descriptor as D, Service as S};
use matches::assert_matches;
use tokio::sync::broadcast;

use crate::att::Handle;
use crate::{host, SyncMutex, Uuid};

use super::*;

#[derive(Clone, Debug, Eq, PartialEq)]
enum Call {
    Enumerate(Uuid),
    Write(Uuid, Attr, Vec<u8>),
}

/// Transport that records all requests.
#[derive(Debug, Default)]
struct Recorder(SyncMutex<Vec<Call>>);

impl Recorder {
    fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.0.lock())
    }
}

impl host::Transport for Recorder {
    fn enumerate(&self, svc: Uuid) {
        self.0.lock().push(Call::Enumerate(svc));
    }

    fn write(&self, svc: Uuid, attr: Attr, val: &[u8]) {
        self.0.lock().push(Call::Write(svc, attr, val.to_vec()));
    }
}

const BAS: Uuid = S::Battery.uuid();
const HRS: Uuid = S::HeartRate.uuid();

const fn h(v: u16) -> Handle {
    match Handle::new(v) {
        Some(h) => h,
        None => panic!("invalid handle"),
    }
}

fn connected() -> (Arc<Recorder>, Controller) {
    let t = Arc::new(Recorder::default());
    let ctlr = Controller::new(Arc::clone(&t) as Arc<dyn host::Transport>);
    ctlr.handle_event(Event::Connected);
    (t, ctlr)
}

fn drain(rx: &mut broadcast::Receiver<ServiceEvent>) -> Vec<ServiceEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

/// Battery service with a writable level at 0x0003 (CCCD at 0x0004) and a
/// read-only characteristic at 0x0006.
fn discover_battery(ctlr: &Controller) -> Service {
    let svc = ctlr.service(BAS).unwrap();
    svc.discover_details();
    ctlr.handle_event(Event::Characteristic {
        svc: BAS,
        hdl: h(0x0006),
        uuid: C::ModelNumberString.uuid(),
        props: Prop::READ,
    });
    ctlr.handle_event(Event::Characteristic {
        svc: BAS,
        hdl: h(0x0003),
        uuid: C::BatteryLevel.uuid(),
        props: Prop::READ | Prop::WRITE | Prop::NOTIFY,
    });
    ctlr.handle_event(Event::Descriptor {
        svc: BAS,
        char_hdl: h(0x0003),
        hdl: h(0x0004),
        uuid: D::ClientCharacteristicConfiguration.uuid(),
    });
    ctlr.handle_event(Event::EnumerationComplete { svc: BAS });
    svc
}

#[test]
fn discovery() {
    let (t, ctlr) = connected();
    let svc = ctlr.service(BAS).unwrap();
    assert_eq!(svc.state(), State::DiscoveryRequired);
    assert_eq!(svc.name(), "Battery");
    assert_eq!(svc.typ(), ServiceType::PRIMARY);
    assert!(svc.characteristics().is_empty());
    let mut rx = svc.events();

    let svc = discover_battery(&ctlr);
    assert_eq!(t.take(), [Call::Enumerate(BAS)]);
    assert_eq!(svc.state(), State::ServiceDiscovered);
    assert_eq!(svc.error(), None);
    assert_eq!(
        drain(&mut rx),
        [
            ServiceEvent::StateChanged(State::DiscoveringServices),
            ServiceEvent::StateChanged(State::ServiceDiscovered),
        ]
    );

    let chars = svc.characteristics();
    let hdls: Vec<Handle> = chars.iter().map(Characteristic::handle).collect();
    assert_eq!(hdls, [h(0x0003), h(0x0006)]);
    let lvl = svc.characteristic(C::BatteryLevel.uuid()).unwrap();
    assert_eq!(lvl, chars[0]);
    assert_eq!(lvl.name(), Some("Battery Level"));
    assert!(lvl.properties().contains(Prop::WRITE));
    assert!(lvl.value().is_empty());
    let descs = lvl.descriptors();
    assert_eq!(descs.len(), 1);
    assert_eq!(descs[0].handle(), h(0x0004));
    assert_eq!(descs[0].characteristic_handle(), h(0x0003));
    assert_eq!(
        lvl.descriptor(D::ClientCharacteristicConfiguration.uuid()),
        Some(descs[0].clone())
    );
    assert_eq!(lvl.descriptor_at(h(0x0005)), None);
    assert_eq!(svc.characteristic_at(h(0x0006)), Some(chars[1].clone()));
    assert!(svc.contains_characteristic(&lvl));
    assert!(svc.contains_descriptor(&descs[0]));
}

#[test]
fn unknown_service() {
    let (_, ctlr) = connected();
    let u = Uuid::new(0x0000_FFF0_1234_5678_9ABC_DEF0_1234_5678).unwrap();
    let svc = ctlr.service(u).unwrap();
    assert_eq!(svc.name(), UNKNOWN_SERVICE);
    assert_eq!(svc.uuid(), u);
}

#[test]
fn shared_session() {
    let (t, ctlr) = connected();
    let a = ctlr.service(BAS).unwrap();
    let b = ctlr.service(BAS).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.id(), b.id());
    assert_eq!(ctlr.services(), [a.clone()]);

    a.discover_details();
    b.discover_details();
    assert_eq!(t.take(), [Call::Enumerate(BAS)]);
    assert_eq!(b.state(), State::DiscoveringServices);

    ctlr.handle_event(Event::EnumerationComplete { svc: BAS });
    assert_eq!(a.state(), State::ServiceDiscovered);
    b.discover_details();
    assert!(t.take().is_empty());
}

#[test]
fn discovery_events_out_of_state() {
    let (_, ctlr) = connected();
    let svc = ctlr.service(BAS).unwrap();
    ctlr.handle_event(Event::Characteristic {
        svc: BAS,
        hdl: h(0x0003),
        uuid: C::BatteryLevel.uuid(),
        props: Prop::READ,
    });
    ctlr.handle_event(Event::EnumerationComplete { svc: BAS });
    assert_eq!(svc.state(), State::DiscoveryRequired);
    assert!(svc.characteristics().is_empty());

    // Service without a session
    ctlr.handle_event(Event::EnumerationComplete { svc: HRS });
    assert_eq!(ctlr.services().len(), 1);
}

#[test]
fn write_characteristic() {
    let (t, ctlr) = connected();
    let svc = discover_battery(&ctlr);
    t.take();
    let mut rx = svc.events();
    let lvl = svc.characteristic(C::BatteryLevel.uuid()).unwrap();

    svc.write_characteristic(&lvl, [0x64]);
    let attr = Attr::Char(h(0x0003));
    assert_eq!(t.take(), [Call::Write(BAS, attr, vec![0x64])]);
    assert!(lvl.value().is_empty());

    ctlr.handle_event(Event::WriteConfirmed {
        svc: BAS,
        attr,
        val: vec![0x64],
    });
    assert_eq!(lvl.value(), [0x64]);
    assert_eq!(
        drain(&mut rx),
        [ServiceEvent::CharacteristicChanged {
            hdl: h(0x0003),
            val: vec![0x64],
        }]
    );

    // Identical value
    svc.write_characteristic(&lvl, [0x64]);
    assert!(t.take().is_empty());
    assert!(drain(&mut rx).is_empty());
    assert_eq!(svc.error(), None);

    svc.write_characteristic(&lvl, [0x32]);
    assert_eq!(t.take().len(), 1);
    ctlr.handle_event(Event::WriteFailed { svc: BAS, attr });
    assert_eq!(svc.error(), Some(ServiceError::CharacteristicWrite));
    assert_eq!(lvl.value(), [0x64]);
    assert_eq!(
        drain(&mut rx),
        [ServiceEvent::Error(ServiceError::CharacteristicWrite)]
    );
}

#[test]
fn write_denied() {
    let (t, ctlr) = connected();
    let svc = ctlr.service(BAS).unwrap();
    svc.discover_details();
    ctlr.handle_event(Event::Characteristic {
        svc: BAS,
        hdl: h(0x0003),
        uuid: C::BatteryLevel.uuid(),
        props: Prop::READ | Prop::WRITE,
    });
    t.take();

    // Not yet discovered
    let lvl = svc.characteristic_at(h(0x0003)).unwrap();
    svc.write_characteristic(&lvl, [1]);
    assert!(t.take().is_empty());
    assert_eq!(svc.error(), Some(ServiceError::Operation));

    ctlr.handle_event(Event::Characteristic {
        svc: BAS,
        hdl: h(0x0006),
        uuid: C::ModelNumberString.uuid(),
        props: Prop::READ | Prop::WRITE_WITHOUT_RESPONSE,
    });
    ctlr.handle_event(Event::EnumerationComplete { svc: BAS });

    // No WRITE property
    let mut rx = svc.events();
    let model = svc.characteristic_at(h(0x0006)).unwrap();
    svc.write_characteristic(&model, b"x");
    assert!(t.take().is_empty());
    assert_eq!(drain(&mut rx), [ServiceEvent::Error(ServiceError::Operation)]);
    assert!(model.value().is_empty());
}

#[test]
fn write_descriptor() {
    let (t, ctlr) = connected();
    let svc = discover_battery(&ctlr);
    t.take();
    let lvl = svc.characteristic(C::BatteryLevel.uuid()).unwrap();
    let cccd = lvl.descriptors().remove(0);
    let attr = Attr::Desc(h(0x0003), h(0x0004));

    svc.write_descriptor(&cccd, [0x01, 0x00]);
    assert_eq!(t.take(), [Call::Write(BAS, attr, vec![0x01, 0x00])]);
    ctlr.handle_event(Event::WriteConfirmed {
        svc: BAS,
        attr,
        val: vec![0x01, 0x00],
    });
    assert_eq!(cccd.value(), [0x01, 0x00]);

    svc.write_descriptor(&cccd, [0x00, 0x00]);
    ctlr.handle_event(Event::WriteFailed { svc: BAS, attr });
    assert_eq!(svc.error(), Some(ServiceError::DescriptorWrite));
    assert_eq!(cccd.value(), [0x01, 0x00]);
}

#[test]
fn value_changed() {
    let (_, ctlr) = connected();
    let svc = discover_battery(&ctlr);
    let mut rx = svc.events();
    ctlr.handle_event(Event::ValueChanged {
        svc: BAS,
        hdl: h(0x0003),
        val: vec![0x50],
    });
    let lvl = svc.characteristic(C::BatteryLevel.uuid()).unwrap();
    assert_eq!(lvl.value(), [0x50]);
    assert_matches!(
        drain(&mut rx).as_slice(),
        [ServiceEvent::CharacteristicChanged { val, .. }] if val == &[0x50]
    );

    // Unknown characteristic
    ctlr.handle_event(Event::ValueChanged {
        svc: BAS,
        hdl: h(0x0010),
        val: vec![0x01],
    });
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn foreign_attributes() {
    let (t, ctlr) = connected();
    let bas = discover_battery(&ctlr);
    let hrs = ctlr.service(HRS).unwrap();
    hrs.discover_details();
    ctlr.handle_event(Event::Characteristic {
        svc: HRS,
        hdl: h(0x0003),
        uuid: C::HeartRateControlPoint.uuid(),
        props: Prop::WRITE,
    });
    ctlr.handle_event(Event::EnumerationComplete { svc: HRS });
    t.take();

    let lvl = bas.characteristic(C::BatteryLevel.uuid()).unwrap();
    let cccd = lvl.descriptors().remove(0);
    assert!(!hrs.contains_characteristic(&lvl));
    assert!(!hrs.contains_descriptor(&cccd));
    hrs.write_characteristic(&lvl, [1]);
    hrs.write_descriptor(&cccd, [1, 0]);
    assert!(t.take().is_empty());
    assert_eq!(hrs.error(), None);

    // Same handle in a different controller
    let (_, other) = connected();
    let other = discover_battery(&other);
    assert!(!bas.contains_characteristic(&other.characteristic_at(h(0x0003)).unwrap()));
}

#[test]
fn disconnect() {
    let (t, ctlr) = connected();
    let svc = discover_battery(&ctlr);
    let lvl = svc.characteristic(C::BatteryLevel.uuid()).unwrap();
    ctlr.handle_event(Event::ValueChanged {
        svc: BAS,
        hdl: h(0x0003),
        val: vec![0x50],
    });
    t.take();
    let mut rx = svc.events();

    ctlr.handle_event(Event::Disconnected);
    assert!(!ctlr.is_connected());
    assert_eq!(svc.state(), State::InvalidService);
    assert!(!svc.is_valid());
    assert_eq!(
        drain(&mut rx),
        [ServiceEvent::StateChanged(State::InvalidService)]
    );

    // Tree is frozen
    assert_eq!(svc.characteristics().len(), 2);
    assert_eq!(lvl.value(), [0x50]);
    ctlr.handle_event(Event::ValueChanged {
        svc: BAS,
        hdl: h(0x0003),
        val: vec![0x10],
    });
    assert_eq!(lvl.value(), [0x50]);

    svc.discover_details();
    assert_eq!(svc.state(), State::InvalidService);
    assert_eq!(svc.error(), Some(ServiceError::ServiceNotValid));
    svc.write_characteristic(&lvl, [0x01]);
    assert_eq!(svc.error(), Some(ServiceError::Operation));
    assert!(t.take().is_empty());

    assert_eq!(ctlr.service(BAS), Err(Error::NotConnected));
    assert!(ctlr.services().is_empty());

    // Reconnect creates a new session
    ctlr.handle_event(Event::Connected);
    let new = ctlr.service(BAS).unwrap();
    assert_ne!(new, svc);
    assert_ne!(new.id(), svc.id());
    assert_eq!(new.state(), State::DiscoveryRequired);
    assert!(new.characteristics().is_empty());
    assert!(!new.contains_characteristic(&lvl));
    assert_eq!(svc.state(), State::InvalidService);
}

#[test]
fn disconnect_while_discovering() {
    let (t, ctlr) = connected();
    let a = ctlr.service(BAS).unwrap();
    let b = ctlr.service(BAS).unwrap();
    a.discover_details();
    ctlr.handle_event(Event::Characteristic {
        svc: BAS,
        hdl: h(0x0003),
        uuid: C::BatteryLevel.uuid(),
        props: Prop::READ | Prop::WRITE,
    });
    t.take();

    ctlr.handle_event(Event::Disconnected);
    assert_eq!(a.state(), State::InvalidService);
    assert_eq!(b.state(), State::InvalidService);
    let lvl = b.characteristic(C::BatteryLevel.uuid()).unwrap();
    assert_eq!(lvl.handle(), h(0x0003));
    assert!(a.contains_characteristic(&lvl));

    // Late completion is ignored
    let mut rx = a.events();
    ctlr.handle_event(Event::EnumerationComplete { svc: BAS });
    assert_eq!(a.state(), State::InvalidService);
    assert!(drain(&mut rx).is_empty());

    b.discover_details();
    assert_eq!(a.error(), Some(ServiceError::ServiceNotValid));
    assert_eq!(a.characteristics().len(), 1);
    assert!(t.take().is_empty());
}

#[test]
fn invalid_sessions_released() {
    let (_, ctlr) = connected();
    let kept = ctlr.service(BAS).unwrap();
    let lvl = discover_battery(&ctlr).characteristic_at(h(0x0003)).unwrap();
    drop(kept);
    ctlr.handle_event(Event::Disconnected);
    for _ in 0..100 {
        ctlr.handle_event(Event::Connected);
        drop(ctlr.service(BAS).unwrap());
        drop(ctlr.service(HRS).unwrap());
        ctlr.handle_event(Event::Disconnected);
        assert_eq!(ctlr.session_count(), 1);
    }

    // The characteristic view keeps its invalid session readable
    assert_eq!(lvl.service().state(), State::InvalidService);
    assert_eq!(lvl.properties(), Prop::READ | Prop::WRITE | Prop::NOTIFY);
    drop(lvl);
    ctlr.handle_event(Event::Connected);
    let svc = ctlr.service(BAS).unwrap();
    assert_eq!(ctlr.session_count(), 1);
    assert_eq!(svc.state(), State::DiscoveryRequired);
}

#[test]
fn included_services() {
    let (_, ctlr) = connected();
    let hrs = ctlr.service(HRS).unwrap();
    hrs.discover_details();
    ctlr.handle_event(Event::Included { svc: HRS, uuid: BAS });
    ctlr.handle_event(Event::Included { svc: HRS, uuid: BAS });
    ctlr.handle_event(Event::Included { svc: HRS, uuid: HRS });
    assert_eq!(hrs.included_services().as_slice(), [BAS]);

    // Session created after the include was reported
    let bas = ctlr.service(BAS).unwrap();
    assert_eq!(bas.typ(), ServiceType::PRIMARY | ServiceType::INCLUDED);
    assert_eq!(hrs.typ(), ServiceType::PRIMARY);

    // Session created before the include was reported
    let dis = ctlr.service(S::DeviceInformation.uuid()).unwrap();
    ctlr.handle_event(Event::Included {
        svc: HRS,
        uuid: dis.uuid(),
    });
    assert!(dis.typ().contains(ServiceType::INCLUDED));

    ctlr.handle_event(Event::Disconnected);
    ctlr.handle_event(Event::Connected);
    assert_eq!(ctlr.service(BAS).unwrap().typ(), ServiceType::PRIMARY);
}

#[test]
fn poll_events() {
    let (t, ctlr) = connected();
    let svc = ctlr.service(BAS).unwrap();
    svc.discover_details();
    let tx = ctlr.events();
    assert!(tx.send(Event::Characteristic {
        svc: BAS,
        hdl: h(0x0003),
        uuid: C::BatteryLevel.uuid(),
        props: Prop::READ | Prop::WRITE,
    }));
    assert!(tx.send(Event::EnumerationComplete { svc: BAS }));
    assert_eq!(svc.state(), State::DiscoveringServices);

    assert_eq!(ctlr.poll_events(), 2);
    assert_eq!(ctlr.poll_events(), 0);
    assert_eq!(svc.state(), State::ServiceDiscovered);
    assert_eq!(svc.characteristics().len(), 1);
    assert_eq!(t.take(), [Call::Enumerate(BAS)]);
}

#[tokio::test]
async fn event_loop() {
    let (_, ctlr) = connected();
    let svc = ctlr.service(BAS).unwrap();
    let mut rx = svc.events();
    let evl = ctlr.event_loop().unwrap();
    assert_matches!(ctlr.event_loop(), Err(Error::EventLoopRunning));
    assert_eq!(ctlr.poll_events(), 0);

    svc.discover_details();
    assert_eq!(
        rx.recv().await.unwrap(),
        ServiceEvent::StateChanged(State::DiscoveringServices)
    );
    ctlr.events().send(Event::EnumerationComplete { svc: BAS });
    let e = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv()).await;
    assert_eq!(
        e.unwrap().unwrap(),
        ServiceEvent::StateChanged(State::ServiceDiscovered)
    );
    evl.stop().await.unwrap();

    // Mailbox is returned to the controller
    ctlr.events().send(Event::Disconnected);
    assert_eq!(ctlr.poll_events(), 1);
    assert_eq!(svc.state(), State::InvalidService);
    ctlr.event_loop().unwrap().stop().await.unwrap();
}

#[test]
fn config() {
    let cfg: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.event_capacity, 32);
    let cfg: Config = serde_json::from_str(r#"{"event_capacity": 0}"#).unwrap();
    assert_eq!(serde_json::to_string(&cfg).unwrap(), r#"{"event_capacity":0}"#);

    // Zero capacity still delivers events
    let t = Arc::new(Recorder::default());
    let ctlr = Controller::with_config(t, cfg);
    ctlr.handle_event(Event::Connected);
    let svc = ctlr.service(BAS).unwrap();
    let mut rx = svc.events();
    svc.discover_details();
    assert_eq!(
        drain(&mut rx),
        [ServiceEvent::StateChanged(State::DiscoveringServices)]
    );
}

#[test]
fn attr_and_event() {
    assert_eq!(Attr::Char(h(3)).handle(), h(3));
    assert_eq!(Attr::Desc(h(3), h(4)).handle(), h(4));
    assert!(Attr::Char(h(5)) < Attr::Desc(h(1), h(2)));
    assert_eq!(Event::Connected.service(), None);
    assert_eq!(Event::EnumerationComplete { svc: HRS }.service(), Some(HRS));
}
