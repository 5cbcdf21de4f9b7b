//! Audio side of the task: tone sequences, click trains, the per-trial
//! combined stream and the playback backends that play it.

pub mod buffer;
pub mod click;
pub mod error;
pub mod player;
pub mod resample;
pub mod stream;
pub mod tone;
pub mod wav;

#[cfg(feature = "playback")]
pub mod cpal_player;

pub use buffer::StereoBuffer;
pub use click::{create_audio_stream, ClickTrain};
pub use error::AudioError;
pub use player::{AudioPlayer, SimulatedPlayer};
pub use stream::{assemble_stream, AssembledStream, StreamLayout, StreamTiming};
pub use tone::{generate_tone_sequence, ToneSequenceParams};
pub use wav::{read_wav, write_wav};

#[cfg(feature = "playback")]
pub use cpal_player::CpalPlayer;
