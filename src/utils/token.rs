use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub fn generate_challenge_id(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn generate_record_id() -> String {
    format!("res-{}", uuid::Uuid::new_v4().simple())
}
