//! End-to-end interpreter scenarios against a recording console.

use std::fs;
use std::path::{Path, PathBuf};

use forktale_engine::console::{Console, OptionAction, Rgb, Speech, StyledRun};
use forktale_engine::{EngineError, InterpretError, Interpreter, Preferences, Settings};
use forktale_script::{Value, parse_source};

/// A console that records everything the interpreter emits.
#[derive(Default)]
struct Recorder {
    output: String,
    runs: Vec<StyledRun>,
    links: Vec<(String, OptionAction)>,
    options: Vec<(String, OptionAction)>,
    images: Vec<PathBuf>,
    sounds: Vec<PathBuf>,
    input_enabled: bool,
    clears: usize,
    title: String,
    size: (u32, u32),
}

impl Console for Recorder {
    fn clear(&mut self) {
        self.clears += 1;
        self.output.clear();
        self.runs.clear();
        self.links.clear();
        self.options.clear();
        self.images.clear();
        self.sounds.clear();
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    fn apply_preferences(&mut self, _prefs: &Preferences) {}

    fn add_text(&mut self, run: StyledRun) {
        self.output.push_str(&run.text);
        self.runs.push(run);
    }

    fn add_link(&mut self, run: StyledRun, action: OptionAction) {
        self.output.push_str(&run.text);
        self.links.push((run.text, action));
    }

    fn add_option(&mut self, run: StyledRun, action: OptionAction) {
        self.options.push((run.text, action));
    }

    fn add_image(&mut self, path: &Path) {
        self.images.push(path.to_path_buf());
    }

    fn play_sound(&mut self, path: &Path) {
        self.sounds.push(path.to_path_buf());
    }
}

/// A speech facade that records synth and recognition traffic.
#[derive(Default)]
struct RecordingSpeech {
    spoken: Vec<String>,
    phrases: Vec<String>,
    listening: bool,
    unloads: usize,
}

impl Speech for RecordingSpeech {
    fn speak(&mut self, text: &str) {
        self.spoken.push(text.to_string());
    }

    fn stop_speaking(&mut self) {}

    fn listen_for(&mut self, phrase: &str) {
        self.phrases.push(phrase.to_string());
    }

    fn start_listening(&mut self) {
        self.listening = true;
    }

    fn stop_listening(&mut self) {
        self.listening = false;
    }

    fn unload_all(&mut self) {
        self.phrases.clear();
        self.unloads += 1;
    }
}

type TestInterp = Interpreter<Recorder, RecordingSpeech>;

/// Strict, non-printing settings so faults surface as errors.
fn strict() -> Settings {
    Settings {
        strict_errors: true,
        print_errors: false,
    }
}

fn load(source: &str) -> TestInterp {
    let mut interp = Interpreter::new(Recorder::default(), RecordingSpeech::default(), strict());
    let game = parse_source(source, Path::new("game.txt")).unwrap();
    interp.load_game(game, None, 0).unwrap();
    interp
}

fn try_load(source: &str, settings: Settings) -> (TestInterp, Result<(), EngineError>) {
    let mut interp = Interpreter::new(Recorder::default(), RecordingSpeech::default(), settings);
    let game = parse_source(source, Path::new("game.txt")).unwrap();
    let result = interp.load_game(game, None, 0);
    (interp, result)
}

// ---------------------------------------------------------------------------
// End-to-end scenarios
// ---------------------------------------------------------------------------

#[test]
fn minimal_fork_renders_and_offers_restart() {
    let interp = load("@start\n{Hello, world.}\n");

    assert_eq!(interp.console().output, "Hello, world.\n");
    assert_eq!(interp.console().options.len(), 1);
    assert_eq!(interp.console().options[0].0, "restart");
    assert_eq!(interp.console().options[0].1, OptionAction::Restart);
}

#[test]
fn conditional_branch_takes_the_true_arm() {
    let interp = load(
        "@start\nset x = 2\nif x > 1\n{big}\nendif\nif x < 1\n{small}\nendif\n",
    );

    assert_eq!(interp.console().output, "big\n");
    assert_eq!(
        interp.vars().get("x"),
        Some(&Value::Decimal(2.into()))
    );
    assert_eq!(
        interp.vars().get("visitedstart"),
        Some(&Value::Boolean(true))
    );
}

#[test]
fn option_click_navigates() {
    let mut interp = load("@start\nGo@next\n@next\n{arrived}\n");

    assert_eq!(interp.console().options.len(), 1);
    assert_eq!(interp.console().options[0].0, "Go");
    assert_eq!(
        interp.vars().get("visitedstart"),
        Some(&Value::Boolean(true))
    );

    let action = interp.console().options[0].1.clone();
    interp.activate(&action, 10).unwrap();

    assert_eq!(interp.console().output, "arrived\n");
    assert_eq!(
        interp.vars().get("visitednext"),
        Some(&Value::Boolean(true))
    );
}

#[test]
fn textbox_pick_matches_any_listed_word() {
    let mut interp = load("@start\nif text pick red,blue,green\n{color chosen}\nendif\n");

    assert!(interp.console().input_enabled);
    assert_eq!(interp.console().output, "");

    interp.submit("I like BLUE best", 10).unwrap();
    assert_eq!(interp.console().output, "color chosen\n");

    interp.submit("none", 20).unwrap();
    assert_eq!(interp.console().output, "color chosen\n");
}

#[test]
fn typewriter_emits_one_character_per_tick() {
    let mut interp = load("@start\nif type 10 hi\n{done}\nendif\n");

    assert_eq!(interp.next_deadline(), Some(10));
    assert_eq!(interp.console().output, "");

    interp.tick(10).unwrap();
    assert_eq!(interp.console().output, "h");

    interp.tick(20).unwrap();
    assert_eq!(interp.console().output, "hi");

    interp.tick(30).unwrap();
    assert_eq!(interp.console().output, "hi\ndone\n");
    assert_eq!(interp.next_deadline(), None);
}

#[test]
fn goto_short_circuits_the_walk() {
    let interp = load("@start\ngoto next\n{never}\n@next\n{here}\n");

    assert_eq!(interp.console().output, "here\n");
    assert_eq!(
        interp.vars().get("visitedstart"),
        Some(&Value::Boolean(true))
    );
    assert_eq!(
        interp.vars().get("visitednext"),
        Some(&Value::Boolean(true))
    );
}

// ---------------------------------------------------------------------------
// Variable store
// ---------------------------------------------------------------------------

#[test]
fn set_then_get_round_trips() {
    let interp = load("@start\nset x = 1\nget x\nset x = x + 1\nget x\n");
    assert_eq!(interp.console().output, "1\n2\n");
}

#[test]
fn set_shorthand_booleans() {
    let interp = load("@start\nset lamp\nset !door\nget lamp\nget door\n");
    assert_eq!(interp.console().output, "true\nfalse\n");
}

#[test]
fn set_expression_form_updates_existing_variable() {
    let interp = load("@start\nset gold = 5\nset gold + 2\nget gold\n");
    assert_eq!(interp.console().output, "7\n");
}

#[test]
fn set_rejects_reserved_and_numeric_names() {
    let (_, result) = try_load("@start\nset 2x = 1\n", strict());
    assert!(matches!(
        result,
        Err(EngineError::Interpret(InterpretError::MalformedCommand(_)))
    ));

    let (_, result) = try_load("@start\nset visited = 1\n", strict());
    assert!(result.is_err());
}

#[test]
fn visited_flag_is_visible_to_expressions() {
    let mut interp = load("@start\nif visited\n{again}\nendif\nGo@start\n");
    assert_eq!(interp.console().output, "");

    interp.activate(&OptionAction::Goto("start".into()), 10).unwrap();
    assert_eq!(interp.console().output, "again\n");
}

// ---------------------------------------------------------------------------
// Fork lifecycle
// ---------------------------------------------------------------------------

#[test]
fn entering_a_fork_cancels_timers_and_handlers() {
    let mut interp = load(
        "@start\nif timer is 1\n{late}\nendif\nif text is go\n{typed}\nendif\nGo@next\n@next\n{x}\n",
    );

    assert_eq!(interp.next_deadline(), Some(1000));
    assert_eq!(interp.submit_handler_count(), 1);

    interp.activate(&OptionAction::Goto("next".into()), 10).unwrap();
    assert_eq!(interp.next_deadline(), None);
    assert_eq!(interp.submit_handler_count(), 0);

    // The old fork's timer never fires.
    interp.tick(5_000).unwrap();
    assert_eq!(interp.console().output, "x\n");
}

#[test]
fn set_fork_normalizes_the_requested_name() {
    let mut interp = load("@start\n{a}\n@The Second\n{b}\n");
    interp.set_fork("The  SECOND", 5).unwrap();

    assert_eq!(interp.console().output, "b\n");
    assert_eq!(interp.current_fork(), "thesecond");
}

#[test]
fn restart_clears_variables_and_reenters_first_fork() {
    let mut interp = load("@start\nset x = 1\n{hi}\n");
    assert!(interp.vars().contains("x"));

    let action = interp.console().options[0].1.clone();
    assert_eq!(action, OptionAction::Restart);
    interp.activate(&action, 10).unwrap();

    // Cleared, then re-created by the fresh walk.
    assert_eq!(interp.console().output, "hi\n");
    assert_eq!(interp.vars().get("x"), Some(&Value::Decimal(1.into())));
    assert_eq!(interp.current_fork(), "start");
}

#[test]
fn auto_restart_respects_disable_and_custom_label() {
    let interp = load("option-default-disable\n@start\n{x}\n");
    assert!(interp.console().options.is_empty());

    let interp = load("option-default-text play again\n@start\n{x}\n");
    assert_eq!(interp.console().options[0].0, "play again");
}

#[test]
fn emitted_option_suppresses_auto_restart() {
    let interp = load("@start\nGo@next\n@next\n{x}\n");
    assert_eq!(interp.console().options.len(), 1);
    assert_eq!(
        interp.console().options[0].1,
        OptionAction::Goto("next".into())
    );
}

#[test]
fn inline_link_does_not_suppress_auto_restart() {
    let interp = load("@start\nlink@Click me@next\n@next\n{x}\n");

    assert_eq!(interp.console().links.len(), 1);
    assert_eq!(
        interp.console().links[0].1,
        OptionAction::Goto("next".into())
    );
    // The options pane still only holds the synthesized restart.
    assert_eq!(interp.console().options.len(), 1);
    assert_eq!(interp.console().options[0].1, OptionAction::Restart);
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[test]
fn color_command_tints_following_output() {
    let interp = load("@start\ncolor fAb\n{tinted}\n");
    let run = interp.console().runs.last().unwrap();
    assert_eq!(run.color, Some(Rgb::new(0xff, 0xaa, 0xbb)));
}

#[test]
fn output_escapes_decode() {
    let interp = load(r"@start
{text with \at \lb \rb \n \s}
");
    assert_eq!(interp.console().output, "text with @ { } \n \\\n");
}

#[test]
fn speak_command_reaches_the_synthesizer() {
    let interp = load("@start\nspeak hello there\n");

    assert_eq!(interp.speech().spoken, vec!["hello there".to_string()]);
    assert_eq!(interp.console().output, "");
}

#[test]
fn speak_condition_registers_a_grammar_and_listens() {
    let interp = load("@start\nif speak open sesame\n{opened}\nendif\n");

    assert_eq!(interp.speech().phrases, vec!["open sesame".to_string()]);
    assert!(interp.speech().listening);
}

#[test]
fn speak_condition_defers_until_phrase_heard() {
    let mut interp = load("@start\nif speak open sesame\n{opened}\nendif\n");
    assert_eq!(interp.console().output, "");

    interp.speech_heard("nothing", 10).unwrap();
    assert_eq!(interp.console().output, "");

    interp.speech_heard("Open Sesame", 20).unwrap();
    assert_eq!(interp.console().output, "opened\n");
}

#[test]
fn typewriter_command_runs_after_following_lines() {
    let mut interp = load("@start\ntype 5 ab\n{now}\n");
    assert_eq!(interp.console().output, "now\n");

    interp.tick(5).unwrap();
    interp.tick(10).unwrap();
    interp.tick(15).unwrap();
    assert_eq!(interp.console().output, "now\nab\n");
}

#[test]
fn img_and_snd_resolve_against_the_game_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(dir.path().join("cover.png"), b"png").unwrap();
    fs::write(dir.path().join("chime.wav"), b"wav").unwrap();
    fs::write(
        dir.path().join("game.txt"),
        "@start\nimg cover.png\nsnd chime.wav\n{ok}\n",
    )
    .unwrap();

    let mut interp = Interpreter::new(Recorder::default(), RecordingSpeech::default(), strict());
    interp
        .load_file(&dir.path().join("game.txt"), None, 0)
        .unwrap();

    assert_eq!(interp.console().images, vec![dir.path().join("cover.png")]);
    assert_eq!(interp.console().sounds, vec![dir.path().join("chime.wav")]);
    assert_eq!(interp.console().output, "ok\n");
}

#[test]
fn missing_image_is_fatal_under_strict() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(dir.path().join("game.txt"), "@start\nimg nope.png\n").unwrap();

    let mut interp = Interpreter::new(Recorder::default(), RecordingSpeech::default(), strict());
    let result = interp.load_file(&dir.path().join("game.txt"), None, 0);
    assert!(matches!(
        result,
        Err(EngineError::Interpret(InterpretError::MissingResource(_)))
    ));
}

#[test]
fn load_new_clears_variables_before_the_new_file_runs() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(
        dir.path().join("a.txt"),
        "@start\nset x = 1\nload new b.txt\n{never}\n",
    )
    .unwrap();
    fs::write(dir.path().join("b.txt"), "@start\n{fresh}\n").unwrap();

    let mut interp = Interpreter::new(Recorder::default(), RecordingSpeech::default(), strict());
    interp.load_file(&dir.path().join("a.txt"), None, 0).unwrap();

    assert_eq!(interp.console().output, "fresh\n");
    assert!(!interp.vars().contains("x"));
    // The new file's own fork completed normally.
    assert_eq!(
        interp.vars().get("visitedstart"),
        Some(&Value::Boolean(true))
    );
}

#[test]
fn plain_load_keeps_variables() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), "@start\nset x = 1\nload b.txt\n").unwrap();
    fs::write(dir.path().join("b.txt"), "@start\nget x\n").unwrap();

    let mut interp = Interpreter::new(Recorder::default(), RecordingSpeech::default(), strict());
    interp.load_file(&dir.path().join("a.txt"), None, 0).unwrap();

    assert_eq!(interp.console().output, "1\n");
}

// ---------------------------------------------------------------------------
// Failure semantics
// ---------------------------------------------------------------------------

#[test]
fn zero_or_unparseable_timer_is_rejected() {
    for bad in ["0", "-1", "NaN", "inf", "soon"] {
        let (_, result) = try_load(&format!("@start\nif timer is {bad}\n{{x}}\nendif\n"), strict());
        assert!(result.is_err(), "timer is {bad} should be rejected");
    }
}

#[test]
fn unknown_identifier_condition_reads_false() {
    let interp = load("@start\nif mystery\n{never}\nendif\n{after}\n");
    assert_eq!(interp.console().output, "after\n");
}

#[test]
fn non_boolean_condition_is_fatal_under_strict() {
    let (_, result) = try_load("@start\nif 1 + 1\n{x}\nendif\n", strict());
    assert!(matches!(
        result,
        Err(EngineError::Interpret(InterpretError::NonBooleanCondition { .. }))
    ));
}

#[test]
fn goto_missing_fork_is_fatal_under_strict() {
    let (_, result) = try_load("@start\ngoto nowhere\n", strict());
    assert!(matches!(
        result,
        Err(EngineError::Interpret(InterpretError::UnknownFork(name))) if name == "nowhere"
    ));
}

#[test]
fn lenient_mode_skips_faults_and_keeps_going() {
    let settings = Settings {
        strict_errors: false,
        print_errors: false,
    };
    let (interp, result) = try_load(
        "@start\nutter nonsense\nif timer is 0\n{never}\nendif\n{ok}\n",
        settings,
    );
    assert!(result.is_ok());
    assert_eq!(interp.console().output, "ok\n");
    assert_eq!(interp.next_deadline(), None);
}

#[test]
fn print_errors_displays_instead_of_propagating() {
    let settings = Settings {
        strict_errors: true,
        print_errors: true,
    };
    let (interp, result) = try_load("@start\ngoto nowhere\n", settings);

    assert!(result.is_ok());
    assert!(interp.console().output.contains("unknown fork"));
    assert!(interp.console().input_enabled);
    assert_eq!(interp.console().options.len(), 1);
    assert_eq!(interp.console().options[0].0, "load file");
    assert_eq!(interp.console().options[0].1, OptionAction::LoadFile);
}

// ---------------------------------------------------------------------------
// Text queries, re-entrant
// ---------------------------------------------------------------------------

#[test]
fn text_is_matches_exactly_case_insensitively() {
    let mut interp = load("@start\nif text is open door\n{opened}\nendif\n");

    interp.submit("open doors", 10).unwrap();
    assert_eq!(interp.console().output, "");

    interp.submit("  OPEN DOOR ", 20).unwrap();
    assert_eq!(interp.console().output, "opened\n");
}

#[test]
fn nested_text_blocks_see_the_same_submission() {
    let mut interp = load(
        "@start\nif text has key\n{has key}\nif text has rusty\n{rusty too}\nendif\nendif\n",
    );

    interp.submit("a rusty key", 10).unwrap();
    assert_eq!(interp.console().output, "has key\nrusty too\n");
}

#[test]
fn submission_can_navigate_via_goto() {
    let mut interp = load("@start\nif text is go\ngoto next\nendif\n@next\n{moved}\n");

    interp.submit("go", 10).unwrap();
    assert_eq!(interp.console().output, "moved\n");
    assert_eq!(interp.current_fork(), "next");
}
