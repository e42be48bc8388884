#![allow(unused_crate_dependencies)]

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, warn};

use gattc::att::Handle;
use gattc::gatt::{self, Attr, Event, Prop, ServiceEvent, State};
use gattc::{host, Uuid};
use gattc_const::{Characteristic, Descriptor, Service};

/// Runs the GATT client against a simulated Battery and Heart Rate
/// peripheral.
#[derive(Clone, Debug, clap::Parser)]
struct Args {
    /// JSON controller configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reject all writes.
    #[arg(short, long)]
    fail_writes: bool,

    /// Number of heart rate notifications to send.
    #[arg(short, long, default_value_t = 3)]
    notify: u8,

    /// Drop the connection at the end.
    #[arg(short, long)]
    disconnect: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let cfg = match args.config {
        Some(ref p) => serde_json::from_str(&std::fs::read_to_string(p)?)
            .with_context(|| format!("invalid configuration: {}", p.display()))?,
        None => gatt::Config::default(),
    };
    let periph = Arc::new(Peripheral::new(args.fail_writes));
    let ctlr = gatt::Controller::with_config(Arc::clone(&periph) as Arc<dyn host::Transport>, cfg);
    periph.attach(ctlr.events());
    let event_loop = ctlr.event_loop()?;
    ctlr.handle_event(Event::Connected);
    let r = run(&args, &ctlr, &periph).await;
    event_loop.stop().await?;
    r
}

async fn run(args: &Args, ctlr: &gatt::Controller, periph: &Peripheral) -> Result<()> {
    for uuid in [Service::Battery.uuid(), Service::HeartRate.uuid()] {
        let svc = ctlr.service(uuid)?;
        let mut rx = svc.events();
        svc.discover_details();
        wait(&mut rx, |e| {
            matches!(e, ServiceEvent::StateChanged(State::ServiceDiscovered))
        })
        .await?;
        svc.dump();
    }
    let bas = ctlr.service(Service::Battery.uuid())?;
    info!("{} type: {:?}", bas.name(), bas.typ());

    let hrs = ctlr.service(Service::HeartRate.uuid())?;
    let mut rx = hrs.events();
    let cp = (hrs.characteristic(Characteristic::HeartRateControlPoint.uuid()))
        .context("missing control point")?;
    hrs.write_characteristic(&cp, [0x01]);
    match wait(&mut rx, |e| {
        matches!(
            e,
            ServiceEvent::CharacteristicChanged { .. } | ServiceEvent::Error(_)
        )
    })
    .await?
    {
        ServiceEvent::Error(e) => warn!("Energy expended reset failed: {e}"),
        _ => info!("Energy expended reset"),
    }

    let hrm = (hrs.characteristic(Characteristic::HeartRateMeasurement.uuid()))
        .context("missing heart rate measurement")?;
    let cccd = (hrm.descriptor(Descriptor::ClientCharacteristicConfiguration.uuid()))
        .context("missing client characteristic configuration")?;
    hrs.write_descriptor(&cccd, [0x01, 0x00]);
    wait(&mut rx, |e| {
        matches!(
            e,
            ServiceEvent::DescriptorChanged { .. } | ServiceEvent::Error(_)
        )
    })
    .await?;
    if cccd.value() == [0x01, 0x00] {
        for bpm in (0..args.notify).map(|i| 60 + i * 5) {
            periph.notify(hrs.uuid(), hrm.handle(), vec![0x00, bpm]);
            wait(&mut rx, |e| {
                matches!(e, ServiceEvent::CharacteristicChanged { .. })
            })
            .await?;
            info!("Heart rate: {:02X?}", hrm.value());
        }
    }

    if args.disconnect {
        periph.send(Event::Disconnected);
        wait(&mut rx, |e| {
            matches!(e, ServiceEvent::StateChanged(State::InvalidService))
        })
        .await?;
        hrs.discover_details();
        info!("After disconnect: {:?}, last error: {:?}", hrs.state(), hrs.error());
        hrs.dump();
    }
    Ok(())
}

/// Waits for the first service event matching `f`.
async fn wait(
    rx: &mut broadcast::Receiver<ServiceEvent>,
    f: impl Fn(&ServiceEvent) -> bool,
) -> Result<ServiceEvent> {
    let recv = async {
        loop {
            let e = rx.recv().await?;
            if f(&e) {
                return Ok::<_, anyhow::Error>(e);
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(1), recv)
        .await
        .context("service event timeout")?
}

/// Simulated peripheral that answers requests through the controller mailbox.
#[derive(Debug)]
struct Peripheral {
    fail_writes: bool,
    tx: OnceLock<gatt::EventSender>,
}

impl Peripheral {
    const fn new(fail_writes: bool) -> Self {
        Self {
            fail_writes,
            tx: OnceLock::new(),
        }
    }

    fn attach(&self, tx: gatt::EventSender) {
        let _ = self.tx.set(tx);
    }

    fn send(&self, e: Event) {
        if !self.tx.get().is_some_and(|tx| tx.send(e)) {
            warn!("Controller is gone");
        }
    }

    fn notify(&self, svc: Uuid, hdl: Handle, val: Vec<u8>) {
        self.send(Event::ValueChanged { svc, hdl, val });
    }
}

impl host::Transport for Peripheral {
    fn enumerate(&self, svc: Uuid) {
        let chr = |hdl, c: Characteristic, props| Event::Characteristic {
            svc,
            hdl: handle(hdl),
            uuid: c.uuid(),
            props,
        };
        let cccd = |char_hdl, hdl| Event::Descriptor {
            svc,
            char_hdl: handle(char_hdl),
            hdl: handle(hdl),
            uuid: Descriptor::ClientCharacteristicConfiguration.uuid(),
        };
        let attrs = if svc == Service::Battery.uuid() {
            vec![
                chr(0x0003, Characteristic::BatteryLevel, Prop::READ | Prop::NOTIFY),
                cccd(0x0003, 0x0004),
            ]
        } else if svc == Service::HeartRate.uuid() {
            vec![
                Event::Included {
                    svc,
                    uuid: Service::Battery.uuid(),
                },
                chr(0x0013, Characteristic::HeartRateMeasurement, Prop::NOTIFY),
                cccd(0x0013, 0x0014),
                chr(0x0016, Characteristic::BodySensorLocation, Prop::READ),
                chr(0x0018, Characteristic::HeartRateControlPoint, Prop::WRITE),
            ]
        } else {
            Vec::new()
        };
        for e in attrs {
            self.send(e);
        }
        self.send(Event::EnumerationComplete { svc });
    }

    fn write(&self, svc: Uuid, attr: Attr, val: &[u8]) {
        self.send(if self.fail_writes {
            Event::WriteFailed { svc, attr }
        } else {
            Event::WriteConfirmed {
                svc,
                attr,
                val: val.to_vec(),
            }
        });
    }
}

fn handle(v: u16) -> Handle {
    Handle::new(v).expect("invalid handle")
}
