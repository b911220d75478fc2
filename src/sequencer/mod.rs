//! The sequencer: header parsing, per-part ticking, and the opcode
//! interpreter that drives a [`crate::psg::SampleGenerator`].

mod context;
mod envelope;
pub(crate) mod header;
mod lfo;
mod part;
mod repeat;

pub use context::{ChannelHandle, Context, Patch};
pub use envelope::{EnvelopeGenerator, Phase};
pub use header::Header;
pub use lfo::Lfo;
pub use part::{Part, TickResult};
pub use repeat::RepeatStack;

use std::cell::RefCell;
use std::rc::Rc;

use crate::psg::SampleGenerator;
use crate::SequenceData;

/// Owns the parsed header, the shared [`Context`], and up to three
/// [`Part`]s — one per channel the score actually uses.
pub struct Sequencer {
    header: Header,
    parts: [Option<Part>; 3],
    psg: Rc<RefCell<SampleGenerator>>,
}

impl Sequencer {
    /// Parses `data`'s header and builds one [`Part`] per present channel,
    /// all driving `psg`.
    pub fn new<D: SequenceData + 'static>(
        psg: SampleGenerator,
        data: D,
    ) -> crate::error::Result<Self> {
        let data: Rc<dyn SequenceData> = Rc::new(data);
        let header = Header::parse(data.as_ref())?;
        let psg = Rc::new(RefCell::new(psg));
        let context = Rc::new(Context::new(
            Rc::clone(&data),
            Rc::clone(&psg),
            header.envelope_table_offset(),
        ));

        let channel_offsets = header.channel_offsets();
        let parts = std::array::from_fn(|i| {
            channel_offsets[i].map(|offset| Part::new(Rc::clone(&context), offset, i))
        });

        Ok(Self { header, parts, psg })
    }

    /// The score's title.
    pub fn title(&self) -> &str {
        self.header.title()
    }

    /// A clone of the shared handle to the PSG this sequencer drives,
    /// suitable for handing to a [`crate::SampleBlockGenerator`] alongside
    /// this sequencer.
    pub fn sample_generator(&self) -> Rc<RefCell<SampleGenerator>> {
        Rc::clone(&self.psg)
    }

    /// Advances every still-active part by one tick, retiring any that
    /// finish.
    pub fn tick(&mut self) {
        for slot in &mut self.parts {
            if let Some(part) = slot {
                if part.tick() == TickResult::Finished {
                    *slot = None;
                }
            }
        }
    }

    /// True iff all three channel slots are still active: a channel that
    /// was absent from the header counts as inactive from the start, so a
    /// one- or two-channel score reports `false` as soon as it is queried,
    /// and a three-channel score reports `false` the instant any one part
    /// finishes.
    pub fn is_playing(&self) -> bool {
        self.parts.iter().all(|slot| slot.is_some())
    }

    /// The minimum infinite-repeat count across all three parts while every
    /// slot is still active; `0` once any part has finished (or was
    /// absent).
    pub fn loop_count(&self) -> u32 {
        if !self.is_playing() {
            return 0;
        }
        self.parts
            .iter()
            .filter_map(|slot| slot.as_ref().map(Part::infinite_loop_count))
            .min()
            .unwrap_or(0)
    }
}
