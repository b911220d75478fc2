//! The opcode interpreter: one instance per active channel.

use std::rc::Rc;

use crate::psg::Output;
use crate::sequencer::context::{ChannelHandle, Context};
use crate::sequencer::envelope::EnvelopeGenerator;
use crate::sequencer::lfo::Lfo;
use crate::sequencer::repeat::RepeatStack;

/// The outcome of one [`Part::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickResult {
    /// The part is still playing.
    Alive,
    /// The part hit its end-of-part opcode; its slot should be retired.
    Finished,
}

/// One channel's worth of sequencer state: cursor into the opcode stream,
/// the note currently sounding, and the envelope/LFO/repeat machinery that
/// drives it.
pub struct Part {
    context: Rc<Context>,
    channel: ChannelHandle,
    next_offset: u32,
    length_count: u16,
    is_tie: bool,
    octave: u8,
    /// Raw volume as last set by opcode `0xE1` — intentionally
    /// unvalidated; see [`Self::apply_volume`].
    volume: u8,
    tune: u16,
    detune: i16,
    envelope: EnvelopeGenerator,
    repeat_stack: RepeatStack,
    lfo: Lfo,
    infinite_loop_count: u32,
}

impl Part {
    /// Builds a part starting at `channel_offset` in the score, bound to
    /// channel `channel_index` of the shared PSG.
    ///
    /// Per construction, the channel starts with its tone gate enabled and
    /// its noise gate disabled.
    pub fn new(context: Rc<Context>, channel_offset: u32, channel_index: usize) -> Self {
        let channel = context.get_channel(channel_index);
        channel.set_mode(Output::TONE);
        Self {
            context,
            channel,
            next_offset: channel_offset,
            length_count: 0,
            is_tie: false,
            octave: 0,
            volume: 0,
            tune: 0,
            detune: 0,
            envelope: EnvelopeGenerator::new(),
            repeat_stack: RepeatStack::new(),
            lfo: Lfo::new(false, 1, 0, 0, 0),
            infinite_loop_count: 0,
        }
    }

    /// The raw volume last set by opcode `0xE1`, unvalidated and unscaled by
    /// the envelope. Exposed crate-internally so tests can observe the
    /// opcode interpreter's effect on it directly.
    #[cfg(test)]
    pub(crate) fn volume(&self) -> u8 {
        self.volume
    }

    /// The number of infinite repeat frames this part has closed over.
    pub fn infinite_loop_count(&self) -> u32 {
        self.infinite_loop_count
    }

    fn next_byte(&mut self) -> u8 {
        let byte = self.context.get_byte(self.next_offset);
        self.next_offset += 1;
        byte
    }

    fn next_signed_short(&mut self) -> i16 {
        let value = self.context.get_signed_short(self.next_offset);
        self.next_offset += 2;
        value
    }

    fn apply_tune(&mut self) {
        let raw = self.tune as i32 + self.lfo.current() as i32 + self.detune as i32;
        let clamped = (raw >> self.octave).clamp(0, 4095) as u16;
        self.channel.set_tune_clamped(clamped);
    }

    fn apply_volume(&mut self) {
        let level = ((self.envelope.current() as i32 * self.volume as i32) >> 8) as u8;
        self.channel.set_volume_masked(level);
    }

    fn update_volume(&mut self) {
        self.envelope.update();
        self.apply_volume();
    }

    /// Advances this part by one sequencer tick.
    pub fn tick(&mut self) -> TickResult {
        if self.lfo.update() {
            self.apply_tune();
        }

        self.length_count = self.length_count.saturating_sub(1);
        if self.length_count != 0 {
            self.update_volume();
            return TickResult::Alive;
        }

        if !self.is_tie {
            self.envelope.release();
        }
        self.update_volume();
        self.run_opcode_loop()
    }

    fn run_opcode_loop(&mut self) -> TickResult {
        loop {
            let op = self.next_byte();
            match op {
                0x00..=0x7F => {
                    self.length_count = op as u16 + 1;
                    return TickResult::Alive;
                }
                0x80..=0xDF => {
                    let note = op - 0x80;
                    let (tune, octave) = self.context.get_tune_and_octave(note);
                    self.tune = tune;
                    self.octave = octave;
                    if !self.is_tie {
                        self.envelope.attack();
                        self.lfo.reset();
                    }
                    let length_byte = self.next_byte();
                    self.length_count = if length_byte == 0 { 256 } else { length_byte as u16 };
                    self.is_tie = self.context.get_byte(self.next_offset) == 0xE8;
                    if self.is_tie {
                        self.next_offset += 1;
                    }
                    self.apply_tune();
                    self.apply_volume();
                    return TickResult::Alive;
                }
                0xE0 => {
                    let patch_id = self.next_byte();
                    if let Some(patch) = self.context.find_patch(patch_id) {
                        self.envelope.set_parameter(patch);
                    }
                }
                0xE1 => {
                    self.volume = self.next_byte();
                }
                0xE2 => {
                    let count = self.next_byte();
                    let offset = self.next_offset;
                    self.repeat_stack.start(count, offset);
                }
                0xE3 => {
                    self.next_offset = self.repeat_stack.break_if_last(self.next_offset);
                }
                0xE4 => {
                    let (next_offset, is_infinite) = self.repeat_stack.end(self.next_offset);
                    self.next_offset = next_offset;
                    if is_infinite {
                        self.infinite_loop_count = self.infinite_loop_count.wrapping_add(1);
                    }
                }
                0xE5 => {
                    let frequency = self.next_byte();
                    self.context.set_noise_frequency(frequency);
                }
                0xE6 => {
                    // Equality check, not a range check: a volume already
                    // above 15 (possible via an unvalidated 0xE1 load)
                    // keeps climbing instead of clamping at 15.
                    if self.volume != 15 {
                        self.volume = self.volume.wrapping_add(1);
                    }
                }
                0xE7 => {
                    if self.volume != 0 {
                        self.volume = self.volume.wrapping_sub(1);
                    }
                }
                0xE8 => {
                    // Only meaningful when peeked by the note handler; an
                    // in-stream occurrence here is a no-op that just
                    // consumes the byte.
                }
                0xE9 => {
                    self.detune = self.next_signed_short();
                }
                0xEA => {
                    let delay = self.next_byte();
                    let speed = self.next_byte();
                    let depth = self.next_byte();
                    let value = self.next_signed_short();
                    let delay = if delay == 0 { 256 } else { delay as u16 };
                    self.lfo = Lfo::new(true, delay, speed, depth, value);
                }
                0xEB => {
                    let enable = self.next_byte();
                    self.lfo.set_enable(enable != 0);
                }
                0xEC => {
                    let mode = self.next_byte();
                    self.channel.set_mode(Output::from_bits_truncate(mode));
                }
                0xFF => {
                    self.channel.set_volume_masked(0);
                    return TickResult::Finished;
                }
                _ => {
                    // Reserved/unmapped opcode: consume the byte and move on.
                }
            }
        }
    }
}
