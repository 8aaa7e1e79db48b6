// src/estimator.rs

use crate::config::EstimatorConfig;
use crate::model::*;
use log::debug;
use rayon::prelude::*;

/// Turns the shape of a commit into an hours estimate.
///
/// The estimate is `base * type * files * language`, rounded to the nearest
/// `quantum` (never below one quantum) and never above `max_hours`. It depends
/// only on the commit and the config, so the same input always yields the
/// same result.
#[derive(Debug, Clone, Default)]
pub struct Estimator {
    config: EstimatorConfig,
}

impl Estimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn estimate(&self, commit: &CommitRecord) -> EstimationResult {
        let message = commit.message.to_lowercase();

        let (base_hours, size) = self.base_hours(commit.total_changes());
        let (change_type, type_multiplier) = self.commit_type(&message);
        let file_multiplier = self.file_multiplier(commit.files().len());
        let lang_multiplier = self.language_multiplier(commit.files());

        let multipliers = [base_hours, type_multiplier, file_multiplier, lang_multiplier];
        let raw: f64 = multipliers.iter().product();
        let hours_total = self.quantize(raw);

        debug!(
            "{}: {} changes, {:?}/{:?}, {:?} -> {:.3}h -> {}h",
            commit.hash,
            commit.total_changes(),
            size,
            change_type,
            multipliers,
            raw,
            hours_total
        );

        EstimationResult {
            hours_total,
            change_value: ChangeValue { size, change_type, multipliers, hours_total },
        }
    }

    /// Estimates every commit in parallel, keeping the input order.
    pub fn estimate_all(&self, commits: Vec<CommitRecord>) -> Vec<EstimatedCommit> {
        commits
            .into_par_iter()
            .map(|commit| {
                let estimate = self.estimate(&commit);
                EstimatedCommit { commit, estimate }
            })
            .collect()
    }

    // Logarithmic in the line count, so huge mechanical diffs don't dominate.
    fn base_hours(&self, total_changes: u64) -> (f64, SizeCategory) {
        let base_hours = if total_changes == 0 {
            self.config.empty_commit_hours
        } else {
            0.5 * (total_changes as f64 + 1.0).log10() + 0.2
        };
        (base_hours, SizeCategory::from_base_hours(base_hours))
    }

    fn commit_type(&self, lowercase_message: &str) -> (ChangeType, f64) {
        self.config
            .type_rules
            .iter()
            .find(|rule| rule.matches(lowercase_message))
            .map_or((ChangeType::General, 1.0), |rule| (rule.change_type, rule.multiplier))
    }

    fn file_multiplier(&self, num_files: usize) -> f64 {
        self.config
            .file_bands
            .iter()
            .find(|band| num_files > band.more_than)
            .map_or(1.0, |band| band.multiplier)
    }

    fn language_multiplier(&self, files: &[FileChange]) -> f64 {
        let touches_code = files.iter().any(|file| {
            let name = file.name.to_lowercase();
            self.config.coding_extensions.iter().any(|ext| name.contains(ext.as_str()))
        });
        if touches_code {
            self.config.coding_multiplier
        } else {
            1.0
        }
    }

    // Rounds to the nearest quantum, at least one quantum, but never past the
    // largest quantum multiple that still fits under `max_hours`.
    fn quantize(&self, hours: f64) -> f64 {
        let max_hours = self.config.max_hours;
        let quantum = self.config.quantum;
        if quantum <= 0.0 {
            return hours.min(max_hours);
        }
        let ceiling = (max_hours / quantum).floor() * quantum;
        ((hours.min(max_hours) / quantum).round() * quantum).max(quantum).min(ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn commit(message: &str, files: &[(&str, u64, u64)]) -> CommitRecord {
        files
            .iter()
            .fold(CommitBuilder::new("h", "Bob", "b@x.com", "2024-01-01", message), |builder, (name, a, d)| {
                builder.with_file(*name, *a, *d)
            })
            .seal()
    }

    fn n_files(n: usize) -> CommitRecord {
        let mut builder = CommitBuilder::new("h", "a", "e", "d", "misc");
        for i in 0..n {
            builder.add_file(FileChange { name: format!("asset{}.png", i), additions: 1, deletions: 0 });
        }
        builder.seal()
    }

    #[test]
    fn end_to_end_refactor() {
        let raw = "h1|Bob|b@x.com|2024-01-01|refactor cleanup\n10\t5\tsrc/a.js\n2\t1\tREADME.md\n";
        let commits = parser::parse(raw);
        assert_eq!(commits[0].total_changes(), 18);

        let result = Estimator::default().estimate(&commits[0]);
        let [base, kind, files, lang] = result.change_value.multipliers;
        assert!((base - (0.5 * 19f64.log10() + 0.2)).abs() < 1e-12);
        assert!((base - 0.839).abs() < 1e-3);
        assert_eq!(kind, 1.4);
        assert_eq!(files, 1.0);
        assert_eq!(lang, 1.1);
        assert_eq!(result.change_value.change_type, ChangeType::Refactor);
        assert_eq!(result.change_value.size, SizeCategory::Trivial);
        assert_eq!(result.hours_total, 1.25);
        assert_eq!(result.change_value.hours_total, 1.25);
    }

    #[test]
    fn deterministic() {
        let estimator = Estimator::default();
        let c = commit("implement parser", &[("src/parser.rs", 120, 30), ("Cargo.toml", 1, 0)]);
        let first = estimator.estimate(&c);
        let second = estimator.estimate(&c);
        assert_eq!(first, second);
        assert_eq!(first.hours_total.to_bits(), second.hours_total.to_bits());
    }

    #[test]
    fn feature_wins_over_fix() {
        let estimator = Estimator::default();
        let result = estimator.estimate(&commit("add feature and fix bug", &[("a.rs", 1, 1)]));
        assert_eq!(result.change_value.change_type, ChangeType::Feature);
        assert_eq!(result.change_value.multipliers[1], 1.3);
    }

    #[test]
    fn fix_wins_over_test() {
        let (kind, multiplier) = Estimator::default().commit_type("fix flaky test");
        assert_eq!(kind, ChangeType::Bugfix);
        assert_eq!(multiplier, 1.2);
    }

    #[test]
    fn message_types() {
        let estimator = Estimator::default();
        let cases = [
            ("Refactor module layout", ChangeType::Refactor, 1.4),
            ("more unit tests", ChangeType::Test, 1.1),
            ("README tweaks", ChangeType::Documentation, 0.8),
            ("bump deps", ChangeType::Update, 0.9),
            ("perf: avoid allocation", ChangeType::Optimization, 1.3),
            ("wip", ChangeType::General, 1.0),
        ];
        for (message, expected, multiplier) in cases {
            let (kind, m) = estimator.commit_type(&message.to_lowercase());
            assert_eq!(kind, expected, "{}", message);
            assert_eq!(m, multiplier, "{}", message);
        }
    }

    #[test]
    fn file_count_bands() {
        let estimator = Estimator::default();
        for (n, expected) in [(11, 1.3), (10, 1.2), (6, 1.2), (5, 1.1), (3, 1.1), (2, 1.0), (0, 1.0)] {
            let c = n_files(n);
            assert_eq!(estimator.estimate(&c).change_value.multipliers[2], expected, "{} files", n);
        }
    }

    #[test]
    fn coding_files_are_case_insensitive() {
        let estimator = Estimator::default();
        let lang = |files: &[(&str, u64, u64)]| estimator.estimate(&commit("x", files)).change_value.multipliers[3];
        assert_eq!(lang(&[("SRC/Main.RS", 1, 0)]), 1.1);
        assert_eq!(lang(&[("logo.png", 1, 0), ("lib/util.py", 1, 0)]), 1.1);
        assert_eq!(lang(&[("README.md", 1, 0)]), 1.0);
        assert_eq!(lang(&[]), 1.0);
    }

    #[test]
    fn assets_and_docs_are_not_code() {
        let estimator = Estimator::default();
        for name in ["theme/style.css", "data/export.csv", "setup.cfg", "public/index.html", "notes.txt", "logo.svg"] {
            let result = estimator.estimate(&commit("x", &[(name, 1, 0)]));
            assert_eq!(result.change_value.multipliers[3], 1.0, "{}", name);
        }
    }

    #[test]
    fn empty_commit() {
        let result = Estimator::default().estimate(&commit("merge upstream", &[]));
        assert_eq!(result.change_value.multipliers[0], 0.1);
        assert_eq!(result.change_value.size, SizeCategory::Trivial);
        assert_eq!(result.hours_total, 0.25);
    }

    #[test]
    fn huge_commit_is_capped() {
        let files: Vec<(String, u64, u64)> = (0..11).map(|i| (format!("gen/f{}.rs", i), 100_000_000_000_000_000, 0)).collect();
        let files: Vec<(&str, u64, u64)> = files.iter().map(|(n, a, d)| (n.as_str(), *a, *d)).collect();
        let result = Estimator::default().estimate(&commit("refactor everything", &files));
        assert_eq!(result.change_value.size, SizeCategory::Massive);
        assert_eq!(result.hours_total, 16.0);
    }

    #[test]
    fn hours_are_positive_quarter_multiples() {
        let estimator = Estimator::default();
        let messages = ["docs", "add", "fix", "wip", "refactor"];
        for total in [0u64, 1, 2, 9, 18, 99, 1_000, 50_000, 10_000_000] {
            for message in messages {
                for n in [1usize, 3, 6, 11] {
                    let mut builder = CommitBuilder::new("h", "a", "e", "d", message);
                    for i in 0..n {
                        let additions = if i == 0 { total } else { 0 };
                        builder.add_file(FileChange { name: format!("f{}.txt", i), additions, deletions: 0 });
                    }
                    let hours = estimator.estimate(&builder.seal()).hours_total;
                    assert!(hours > 0.0 && hours <= 16.0, "{}", hours);
                    assert_eq!((hours * 4.0).fract(), 0.0, "{}", hours);
                }
            }
        }
    }

    #[test]
    fn custom_config() {
        let config = EstimatorConfig { max_hours: 1.0, ..EstimatorConfig::default() };
        let result = Estimator::new(config).estimate(&commit("add everything", &[("a.rs", 100_000, 0)]));
        assert_eq!(result.hours_total, 1.0);
        assert!(result.change_value.multipliers[0] > 2.0);
    }

    #[test]
    fn cap_below_a_rounding_step() {
        let big = [("a.rs", 100_000, 0)];
        for (max_hours, expected) in [(0.4, 0.25), (0.6, 0.5), (1.1, 1.0), (16.0, 3.75)] {
            let config = EstimatorConfig { max_hours, ..EstimatorConfig::default() };
            let hours = Estimator::new(config).estimate(&commit("add", &big)).hours_total;
            assert_eq!(hours, expected, "max_hours {}", max_hours);
            assert!(hours <= max_hours);
        }
    }

    #[test]
    fn cap_smaller_than_one_step_is_still_respected() {
        let config = EstimatorConfig { max_hours: 0.1, ..EstimatorConfig::default() };
        let hours = Estimator::new(config).estimate(&commit("add", &[("a.rs", 100_000, 0)])).hours_total;
        assert!(hours <= 0.1, "{}", hours);
    }

    #[test]
    fn estimate_all_keeps_order() {
        let commits: Vec<CommitRecord> = (0..50)
            .map(|i| CommitBuilder::new(format!("h{}", i), "a", "e", "d", "m").with_file("a.rs", i, 0).seal())
            .collect();
        let estimated = Estimator::default().estimate_all(commits);
        let hashes: Vec<&str> = estimated.iter().map(|e| e.commit.hash.as_str()).collect();
        let expected: Vec<String> = (0..50).map(|i| format!("h{}", i)).collect();
        assert_eq!(hashes, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }
}
