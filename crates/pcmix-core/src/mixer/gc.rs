//! Deferred deallocation of finished channels
//!
//! Channels live in the table as `basedrop::Owned<Channel>`. When the render
//! pass removes an exhausted channel, dropping the `Owned` only enqueues the
//! pointer; the source (often a fully decoded clip) is freed later on the
//! collector thread, never on the device callback.
//!
//! ```ignore
//! use basedrop::Owned;
//! use crate::mixer::gc::gc_handle;
//!
//! let channel = Owned::new(&gc_handle(), channel);
//! drop(channel); // queued, freed on "pcmix-gc"
//! ```

use basedrop::{Collector, Handle};
use std::sync::mpsc;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

/// How often the collector thread frees queued channels
const COLLECT_INTERVAL: Duration = Duration::from_millis(50);

/// Process-wide handle; the `Collector` itself lives on the GC thread
static GC_HANDLE: OnceLock<Handle> = OnceLock::new();

fn init_gc() -> Handle {
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("pcmix-gc".to_string())
        .spawn(move || {
            // Collector is !Sync, so it is created and kept on this thread
            let mut collector = Collector::new();
            tx.send(collector.handle()).expect("Failed to send GC handle");

            log::debug!("Channel GC thread started");
            loop {
                collector.collect();
                thread::sleep(COLLECT_INTERVAL);
            }
        })
        .expect("Failed to spawn channel GC thread");

    rx.recv().expect("Failed to receive GC handle")
}

/// Handle for wrapping values in `Owned<T>` / `Shared<T>`
pub fn gc_handle() -> Handle {
    GC_HANDLE.get_or_init(init_gc).clone()
}
