#![cfg(test)]

use std::fs;
use tempfile::tempdir;

use crate::game::{BONUS_TIMER, DEFAULT_HISCORES, VOLUME_MAX};
use crate::hud::{ElapsedTimer, HELP_PAGES, Hiscores, Hud, ScoreTicker};
use crate::sound::{SoundEffect, TRACKS};

#[test]
fn test_ticker_counts_up_with_clicks() {
    let mut ticker = ScoreTicker::default();
    let mut cues = Vec::new();

    for _ in 0..4 {
        let (changed, cue) = ticker.tick(3, 1);
        assert!(changed);
        cues.push(cue);
    }

    assert_eq!(
        cues,
        vec![
            Some(SoundEffect::Click),
            Some(SoundEffect::Click),
            Some(SoundEffect::Click),
            None
        ]
    );
    assert_eq!(ticker.tick(3, 1), (false, None));
    assert_eq!(ticker.label(), "Score: 3");
}

#[test]
fn test_bonus_blinks_then_resumes() {
    let mut ticker = ScoreTicker::default();
    ticker.tick(0, 1);

    assert_eq!(ticker.tick(10, 2), (true, Some(SoundEffect::Bonus)));
    assert!(ticker.is_blinking());

    ticker.tick(10, 2);
    assert_eq!(ticker.label(), "Bonus x2");
    for _ in 0..4 {
        ticker.tick(10, 2);
    }
    assert_eq!(ticker.label(), "");

    // The remaining blink ticks leave the score untouched
    for _ in 6..u32::from(BONUS_TIMER) {
        ticker.tick(10, 2);
    }
    assert_eq!(ticker.shown(), 0);
    let (changed, cue) = ticker.tick(10, 2);
    assert!(changed);
    assert_eq!(cue, None);
    assert!(!ticker.is_blinking());

    assert_eq!(ticker.tick(10, 2), (true, Some(SoundEffect::Click)));
    assert_eq!(ticker.shown(), 1);
}

#[test]
fn test_bonus_shows_again_after_multiplier_drop() {
    let mut ticker = ScoreTicker::default();
    ticker.tick(0, 2);
    for _ in 0..BONUS_TIMER {
        ticker.tick(0, 2);
    }
    assert!(!ticker.is_blinking());

    // The label was hidden since the first tick, it catches up now
    assert_eq!(ticker.tick(0, 1), (true, None));
    assert_eq!(ticker.tick(0, 2), (true, Some(SoundEffect::Bonus)));
}

#[test]
fn test_resume_counts_last_point() {
    let mut ticker = ScoreTicker::default();
    ticker.resume(20, 2);

    assert_eq!(ticker.tick(20, 2), (true, None));
    assert_eq!(ticker.label(), "Score: 20");
}

#[test]
fn test_hiscore_insertion() {
    let mut table = Hiscores::default();
    assert_eq!(table.scores, DEFAULT_HISCORES.to_vec());

    assert!(table.insert(35));
    assert_eq!(table.scores, vec![50, 40, 35, 30, 20]);

    assert!(!table.insert(20));
    assert!(!table.insert(3));
    assert!(table.insert(99));
    assert_eq!(table.scores, vec![99, 50, 40, 35, 30]);
}

#[test]
fn test_hiscores_file_handling() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("scores.toml");

    assert_eq!(Hiscores::load(&path), Hiscores::default());

    fs::write(&path, "scores = [7, 90, 12]\n").expect("Failed to write scores");
    assert_eq!(Hiscores::load(&path).scores, vec![90, 12, 7, 0, 0]);

    fs::write(&path, "scores = \"many\"\n").expect("Failed to write scores");
    assert_eq!(Hiscores::load(&path), Hiscores::default());

    let mut table = Hiscores::default();
    table.insert(77);
    table.save(&path).expect("Failed to save scores");
    assert_eq!(Hiscores::load(&path), table);
}

#[test]
fn test_elapsed_label() {
    let mut timer = ElapsedTimer::default();
    assert_eq!(timer.label(), "00:00");

    timer.seconds = 74;
    timer.tick();
    assert_eq!(timer.label(), "01:15");

    timer.seconds = 3600;
    assert_eq!(timer.label(), "60:00");
}

#[test]
fn test_music_and_track_switching() {
    let mut hud = Hud::default();
    assert_eq!(hud.music, Some(0));

    assert_eq!(hud.music_switch(), None);
    assert_eq!(hud.music_switch(), Some(0));

    assert_eq!(hud.track_switch(true), 1);
    assert_eq!(hud.music, Some(1));

    hud.looping = true;
    assert_eq!(hud.track_switch(false), 1);
    assert_eq!(hud.track_switch(true), 2);

    hud.looping = false;
    assert_eq!(hud.track_switch(false), 0);
    assert_eq!(hud.track_title(), TRACKS[0]);

    // A switched off player remembers the track for later
    hud.music_switch();
    hud.track_switch(true);
    assert_eq!(hud.music, None);
    assert_eq!(hud.music_switch(), Some(1));
}

#[test]
fn test_volume_is_clamped() {
    let mut hud = Hud::default();
    assert_eq!(hud.set_volume(-5), 0);
    assert_eq!(hud.set_volume(300), VOLUME_MAX);
    assert_eq!(hud.set_volume(128), 128);
}

#[test]
fn test_help_pages_cycle() {
    let mut hud = Hud::default();
    for page in 0..HELP_PAGES {
        assert!(hud.next_help_page());
        assert_eq!(hud.help, Some(page));
    }
    assert!(!hud.next_help_page());
    assert!(!hud.help_visible());
}

#[test]
fn test_cursor_stays_on_board() {
    let mut hud = Hud::default();
    hud.move_cursor(-10, -10);
    assert_eq!(hud.cursor, (0, 0));
    hud.move_cursor(20, 3);
    assert_eq!(hud.cursor, (8, 3));
}
