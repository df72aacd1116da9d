// Copyright (c) 2024 Mike Tsao

use patchbay::{
    cores::instruments::{PolySynthConfig, PolySynthConfigBuilder, VoiceConfig},
    elements::FilterConfig,
    engine::{FilterType, OfflineEngine},
    prelude::*,
    Error,
};

fn subtractive(
    e: &mut OfflineEngine,
    config: &PolySynthConfig,
    voice: &VoiceConfig,
) -> anyhow::Result<PolySynth<Voice>> {
    Ok(PolySynth::new_with(e, config, |e| {
        Ok(Voice::new_with(e, voice))
    })?)
}

#[test]
fn third_note_steals_the_first_voice() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut e = OfflineEngine::default();
    let mut synth = subtractive(&mut e, &PolySynthConfig::default(), &VoiceConfig::default())?;
    synth.set_polyphony(2);

    let assigned: Vec<usize> = [Note::C4, Note::E4, Note::G4]
        .into_iter()
        .map(|note| synth.note_on(&mut e, note))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(assigned, vec![0, 1, 0]);

    assert_eq!(synth.note_off(&mut e, Note::G4), vec![0]);
    assert_eq!(synth.voices()[0].current_note(), None);
    assert_eq!(synth.voices()[1].current_note(), Some(Note::E4));
    assert!(synth.voices()[0].is_sounding(e.now()), "releasing, not silent");
    Ok(())
}

#[test]
fn polyphony_is_clamped_to_the_pool() -> anyhow::Result<()> {
    let mut e = OfflineEngine::default();
    let mut synth = subtractive(&mut e, &PolySynthConfig::default(), &VoiceConfig::default())?;
    assert_eq!(synth.polyphony(), 8);
    assert_eq!(synth.set_polyphony(0), 1);
    assert_eq!(synth.set_polyphony(9), 8);
    assert_eq!(synth.set_polyphony(-3), 1);
    assert_eq!(synth.pool_size(), 8);
    Ok(())
}

#[test]
fn chords_and_timers() -> anyhow::Result<()> {
    let mut e = OfflineEngine::default();
    let mut synth = subtractive(
        &mut e,
        &PolySynthConfigBuilder::default().voices(4).build()?,
        &VoiceConfig {
            filter: Some(FilterConfig::default()),
            filter_envelope: Some(FrequencyEnvelopeConfig::default()),
            ..Default::default()
        },
    )?;
    assert_eq!(
        synth.note_on(&mut e, [Note::C4, Note::E4, Note::G4])?,
        vec![0, 1, 2]
    );
    // Each voice has an amplitude and a filter envelope waiting to decay.
    assert_eq!(e.pending_timer_count(), 6);
    e.advance(Seconds(1.0), &mut synth);
    assert_eq!(e.fired_timer_count(), 6);
    for voice in &synth.voices()[..3] {
        assert_eq!(
            voice.amplitude_envelope().envelope().state(e.now()),
            EnvelopeState::Sustaining
        );
    }

    assert_eq!(synth.note_on(&mut e, NoteSelector::None), Err(Error::MissingNote));
    assert_eq!(synth.note_stop(&mut e, NoteSelector::None), vec![0, 1, 2]);
    assert!(synth.voices().iter().all(|v| !v.is_sounding(e.now())));
    Ok(())
}

#[test]
fn configs_load_from_json() -> anyhow::Result<()> {
    let poly: PolySynthConfig = serde_json::from_str(r#"{"voices": 3, "volume": 0.25}"#)?;
    assert_eq!(poly.voices, 3);
    assert_eq!(poly.volume, Normal::new(0.25));

    let filter: FilterConfig = serde_json::from_str(
        r#"{"filter-type": "highpass", "frequency": 1200.0, "q": 0.7, "gain": 0.0}"#,
    )?;
    assert_eq!(filter.filter_type, FilterType::Highpass);

    let mut e = OfflineEngine::default();
    let synth = subtractive(
        &mut e,
        &poly,
        &VoiceConfig {
            filter: Some(filter),
            ..Default::default()
        },
    )?;
    assert_eq!(synth.pool_size(), 3);
    assert_eq!(synth.volume(&e), 0.25);
    assert_eq!(
        synth.voices()[0].filter().map(|f| f.filter_type()),
        Some(FilterType::Highpass)
    );
    Ok(())
}
