//! Modifier lookup and option parsing for the command line

use anyhow::{bail, Context, Result};
use beatmash_audio::modifiers::{
    BeatSwapper, DoubleTimer, Identity, MeasureReverser, PatternBeatDropper, PatternBeatReverser,
    PercentageBeatDropper, RandomBeatDropper, RandomSampleDropper, TimeStretcher,
};
use beatmash_audio::SampleModifier;
use std::collections::HashMap;

/// Every modifier the CLI can build, with its option list for `--help`
pub const MODIFIERS: &[(&str, &str)] = &[
    ("identity", "pass audio through unchanged"),
    ("pattern-drop", "--bpm N --pattern 10110  keep beats marked 1, drop beats marked 0"),
    ("percentage-drop", "--bpm N --percent P  keep the leading P percent of every beat"),
    ("random-drop", "--bpm N --percent P --seed S  drop each beat with probability P percent"),
    (
        "random-sample-drop",
        "--window-ms MS --percent P --seed S  drop fixed sample windows with probability P percent",
    ),
    ("swap", "--bpm N --measure M --pattern 4:1:3:2  reorder the beats of each measure"),
    ("reverse-measure", "--bpm N --measure M  play each measure's beats back to front"),
    ("pattern-reverse", "--bpm N --pattern 1000  reverse the samples of beats marked 1"),
    ("double-time", "--bpm N --pattern 1  play marked beats at double speed by decimation"),
    ("stretch", "--bpm N --pattern 1 --factor F  WSOLA time-stretch marked beats by F"),
];

/// Options collected from `--key value` pairs on the command line
pub struct ModifierOptions {
    values: HashMap<String, String>,
}

impl ModifierOptions {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    fn take(&mut self, key: &str) -> Result<String> {
        self.values
            .remove(key)
            .with_context(|| format!("missing required option --{key}"))
    }

    fn take_or(&mut self, key: &str, default: &str) -> String {
        self.values
            .remove(key)
            .unwrap_or_else(|| default.to_string())
    }

    fn take_u32(&mut self, key: &str) -> Result<u32> {
        let raw = self.take(key)?;
        raw.parse()
            .with_context(|| format!("--{key} expects a positive integer, got `{raw}`"))
    }

    fn take_usize(&mut self, key: &str) -> Result<usize> {
        let raw = self.take(key)?;
        raw.parse()
            .with_context(|| format!("--{key} expects a positive integer, got `{raw}`"))
    }

    fn take_i64(&mut self, key: &str) -> Result<i64> {
        let raw = self.take(key)?;
        raw.parse()
            .with_context(|| format!("--{key} expects an integer, got `{raw}`"))
    }

    fn take_f64(&mut self, key: &str) -> Result<f64> {
        let raw = self.take(key)?;
        raw.parse()
            .with_context(|| format!("--{key} expects a number, got `{raw}`"))
    }

    fn finish(self) -> Result<()> {
        if let Some(key) = self.values.keys().next() {
            bail!("unknown option --{key}");
        }
        Ok(())
    }
}

/// Build the named modifier from its parsed options
pub fn build_modifier(id: &str, mut opts: ModifierOptions) -> Result<Box<dyn SampleModifier>> {
    let modifier: Box<dyn SampleModifier> = match id {
        "identity" => Box::new(Identity::new()),
        "pattern-drop" => {
            let bpm = opts.take_u32("bpm")?;
            let pattern = opts.take("pattern")?;
            Box::new(PatternBeatDropper::new(bpm, &pattern)?)
        }
        "percentage-drop" => {
            let bpm = opts.take_u32("bpm")?;
            let percent = opts.take_f64("percent")?;
            Box::new(PercentageBeatDropper::new(bpm, percent)?)
        }
        "random-drop" => {
            let bpm = opts.take_u32("bpm")?;
            let percent = opts.take_f64("percent")?;
            let seed = opts.take_or("seed", "");
            Box::new(RandomBeatDropper::new(bpm, percent, &seed)?)
        }
        "random-sample-drop" => {
            let window_ms = opts.take_i64("window-ms")?;
            let percent = opts.take_f64("percent")?;
            let seed = opts.take_or("seed", "");
            Box::new(RandomSampleDropper::new(window_ms, percent, &seed)?)
        }
        "swap" => {
            let bpm = opts.take_u32("bpm")?;
            let measure = opts.take_usize("measure")?;
            let pattern = opts.take("pattern")?;
            Box::new(BeatSwapper::new(bpm, measure, &pattern)?)
        }
        "reverse-measure" => {
            let bpm = opts.take_u32("bpm")?;
            let measure = opts.take_usize("measure")?;
            Box::new(MeasureReverser::new(bpm, measure)?)
        }
        "pattern-reverse" => {
            let bpm = opts.take_u32("bpm")?;
            let pattern = opts.take("pattern")?;
            Box::new(PatternBeatReverser::new(bpm, &pattern)?)
        }
        "double-time" => {
            let bpm = opts.take_u32("bpm")?;
            let pattern = opts.take("pattern")?;
            Box::new(DoubleTimer::new(bpm, &pattern)?)
        }
        "stretch" => {
            let bpm = opts.take_u32("bpm")?;
            let pattern = opts.take("pattern")?;
            let factor = opts.take_f64("factor")?;
            Box::new(TimeStretcher::new(bpm, &pattern, factor)?)
        }
        other => bail!(
            "unknown modifier `{other}`; run with --help for the list of modifiers"
        ),
    };
    opts.finish()?;
    Ok(modifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> ModifierOptions {
        ModifierOptions::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_builds_every_registered_modifier() {
        let cases: Vec<(&str, Vec<(&str, &str)>)> = vec![
            ("identity", vec![]),
            ("pattern-drop", vec![("bpm", "120"), ("pattern", "10")]),
            ("percentage-drop", vec![("bpm", "120"), ("percent", "50")]),
            (
                "random-drop",
                vec![("bpm", "120"), ("percent", "25"), ("seed", "abc")],
            ),
            (
                "random-sample-drop",
                vec![("window-ms", "30"), ("percent", "25")],
            ),
            (
                "swap",
                vec![("bpm", "120"), ("measure", "4"), ("pattern", "4:1:3:2")],
            ),
            ("reverse-measure", vec![("bpm", "120"), ("measure", "4")]),
            ("pattern-reverse", vec![("bpm", "120"), ("pattern", "1000")]),
            ("double-time", vec![("bpm", "120"), ("pattern", "1")]),
            (
                "stretch",
                vec![("bpm", "120"), ("pattern", "1"), ("factor", "0.5")],
            ),
        ];
        for (id, pairs) in cases {
            assert!(
                build_modifier(id, opts(&pairs)).is_ok(),
                "failed to build {id}"
            );
            assert!(
                MODIFIERS.iter().any(|(name, _)| *name == id),
                "{id} missing from help listing"
            );
        }
    }

    #[test]
    fn test_rejects_unknown_modifier() {
        assert!(build_modifier("bogus", opts(&[])).is_err());
    }

    #[test]
    fn test_rejects_unknown_option() {
        let err = build_modifier("identity", opts(&[("volume", "11")])).unwrap_err();
        assert!(err.to_string().contains("--volume"));
    }

    #[test]
    fn test_rejects_missing_option() {
        let err = build_modifier("pattern-drop", opts(&[("bpm", "120")])).unwrap_err();
        assert!(err.to_string().contains("--pattern"));
    }

    #[test]
    fn test_rejects_unparseable_value() {
        let err = build_modifier(
            "pattern-drop",
            opts(&[("bpm", "fast"), ("pattern", "10")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("--bpm"));
    }
}
