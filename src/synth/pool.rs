use crate::{synth::voice::FmVoice, MAX_VOICES};

/// Fixed set of voices addressed by index. Never grows, never allocates.
#[derive(Debug, Clone)]
pub struct VoicePool {
    voices: [FmVoice; MAX_VOICES],
}

impl VoicePool {
    pub fn new() -> Self {
        Self {
            voices: [FmVoice::default(); MAX_VOICES],
        }
    }

    /// Pick a slot for a new note.
    ///
    /// First pass: lowest-index inactive slot.
    /// Second pass: steal the oldest note (greatest `time_elapsed`), releasing
    /// voices included. Ties go to the lowest index.
    pub fn allocate(&self) -> usize {
        if let Some(idx) = self.voices.iter().position(|v| !v.is_active()) {
            return idx;
        }

        let mut oldest = 0;
        for (idx, voice) in self.voices.iter().enumerate().skip(1) {
            if voice.time_elapsed() > self.voices[oldest].time_elapsed() {
                oldest = idx;
            }
        }
        oldest
    }

    /// First active voice on `channel`.
    pub fn find_on_channel(&mut self, channel: u8) -> Option<&mut FmVoice> {
        self.voices
            .iter_mut()
            .find(|v| v.is_active() && v.channel() == channel)
    }

    /// First voice still holding `note` on `channel`; releasing voices are skipped.
    pub fn find_note(&mut self, channel: u8, note: u8) -> Option<&mut FmVoice> {
        self.voices
            .iter_mut()
            .find(|v| v.is_held() && v.channel() == channel && v.note() == note)
    }

    pub fn voice(&self, idx: usize) -> Option<&FmVoice> {
        self.voices.get(idx)
    }

    pub(crate) fn voice_mut(&mut self, idx: usize) -> &mut FmVoice {
        &mut self.voices[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &FmVoice> {
        self.voices.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut FmVoice> {
        self.voices.iter_mut()
    }

    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::instrument::INSTRUMENTS;

    fn fill(pool: &mut VoicePool) {
        for i in 0..MAX_VOICES {
            pool.voice_mut(i).start(0, 60 + i as u8, 1.0, 0, &INSTRUMENTS[0]);
        }
    }

    #[test]
    fn allocates_lowest_free_slot() {
        let mut pool = VoicePool::new();
        assert_eq!(pool.allocate(), 0);

        pool.voice_mut(0).start(0, 60, 1.0, 0, &INSTRUMENTS[0]);
        pool.voice_mut(1).start(0, 62, 1.0, 0, &INSTRUMENTS[0]);
        assert_eq!(pool.allocate(), 2);

        pool.voice_mut(0).silence();
        assert_eq!(pool.allocate(), 0);
    }

    #[test]
    fn steals_the_oldest_when_full() {
        let mut pool = VoicePool::new();
        fill(&mut pool);
        for (i, voice) in pool.iter_mut().enumerate() {
            voice.time_elapsed = [0.3, 0.1, 0.9, 0.2, 0.5, 0.4, 0.8, 0.6][i];
        }
        assert_eq!(pool.allocate(), 2);
    }

    #[test]
    fn ties_steal_lowest_index() {
        let mut pool = VoicePool::new();
        fill(&mut pool);
        for (i, voice) in pool.iter_mut().enumerate() {
            voice.time_elapsed = if i == 3 || i == 5 { 1.0 } else { 0.5 };
        }
        assert_eq!(pool.allocate(), 3);

        for voice in pool.iter_mut() {
            voice.time_elapsed = 0.0;
        }
        assert_eq!(pool.allocate(), 0);
    }

    #[test]
    fn lookups_only_see_active_voices() {
        let mut pool = VoicePool::new();
        pool.voice_mut(1).start(4, 64, 1.0, 0, &INSTRUMENTS[0]);
        pool.voice_mut(2).start(4, 67, 1.0, 0, &INSTRUMENTS[0]);

        assert_eq!(pool.find_on_channel(4).map(|v| v.note()), Some(64));
        assert_eq!(pool.find_note(4, 67).map(|v| v.note()), Some(67));
        assert!(pool.find_note(5, 67).is_none());

        pool.voice_mut(1).silence();
        assert_eq!(pool.find_on_channel(4).map(|v| v.note()), Some(67));
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn note_lookup_skips_releasing_duplicates() {
        let mut pool = VoicePool::new();
        pool.voice_mut(0).start(2, 60, 1.0, 0, &INSTRUMENTS[0]);
        pool.voice_mut(1).start(2, 60, 1.0, 0, &INSTRUMENTS[0]);

        pool.voice_mut(0).release();
        assert!(!pool.voice(0).unwrap().is_held());
        assert!(pool.voice(0).unwrap().is_active());

        if let Some(voice) = pool.find_note(2, 60) {
            voice.time_elapsed = 7.0;
            voice.release();
        }
        assert_eq!(pool.voice(1).unwrap().time_elapsed(), 7.0);
        assert!(pool.find_note(2, 60).is_none());
        assert_eq!(pool.active_count(), 2);
    }
}
