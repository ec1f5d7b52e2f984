use std::path::Path;

use proptest::prelude::*;
use relaybyte_types::job::JobRunConfig;
use relaybyte_worker::config::{parser, validator};
use relaybyte_worker::AttemptFailure;

proptest! {
    #[test]
    fn job_root_is_workspace_job_attempt(job_id in 0_i64..1_000_000, attempt_id in 0_i64..1_000) {
        let run = JobRunConfig::new(job_id, attempt_id);
        let root = run.job_root(Path::new("/ws"));
        prop_assert_eq!(root.parent().unwrap().to_path_buf(), Path::new("/ws").join(job_id.to_string()));
        prop_assert_eq!(root.file_name().unwrap().to_string_lossy().into_owned(), attempt_id.to_string());
        prop_assert_eq!(run.job_root(Path::new("/ws")), root);
    }

    #[test]
    fn distinct_attempts_get_distinct_roots(
        job_a in 0_i64..1_000, attempt_a in 0_i64..100,
        job_b in 0_i64..1_000, attempt_b in 0_i64..100,
    ) {
        let a = JobRunConfig::new(job_a, attempt_a).job_root(Path::new("/ws"));
        let b = JobRunConfig::new(job_b, attempt_b).job_root(Path::new("/ws"));
        prop_assert_eq!(a == b, (job_a, attempt_a) == (job_b, attempt_b));
    }

    #[test]
    fn failure_keeps_its_log_path(path in "/[a-z]{1,8}(/[a-z0-9]{1,8}){0,3}/logs\\.log") {
        let failure = AttemptFailure::with_cause(&path, anyhow::anyhow!("boom"));
        prop_assert_eq!(failure.log_path(), Path::new(&path));
        prop_assert!(failure.cause().is_some());
    }

    #[test]
    fn negative_ids_are_rejected(job_id in -1_000_i64..1_000, attempt in -10_i32..10) {
        let yaml = format!(
            "job_id: {job_id}\nattempt: {attempt}\njob:\n  kind: get_spec\n  docker_image: relaybyte/source-faker:0.1\n"
        );
        let job = parser::parse_job_str(&yaml).expect("generated yaml must parse");
        let result = validator::validate_job(&job);

        if job_id < 0 || attempt < 0 {
            prop_assert!(result.is_err());
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn images_with_whitespace_are_rejected(name in "[a-z]{1,8}", has_space in any::<bool>()) {
        let image = if has_space { format!("relaybyte/{name} latest") } else { format!("relaybyte/{name}") };
        let yaml = format!(
            "job_id: 1\njob:\n  kind: discover_schema\n  docker_image: \"{image}\"\n"
        );
        let job = parser::parse_job_str(&yaml).expect("generated yaml must parse");
        prop_assert_eq!(validator::validate_job(&job).is_err(), has_space);
    }
}
