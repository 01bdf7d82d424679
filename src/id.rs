use rand::{thread_rng, Rng};

/// Generates opaque visitor identifiers.
pub trait IdGenerator {
    /// Produce a new random identifier.
    fn generate_id(&self) -> String;
}

/// URL-safe alphabet, 64 symbols (6 bits per character).
const ALPHABET: &[u8; 64] = b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";
/// 21 characters give 126 random bits.
const ID_LENGTH: usize = 21;

/// Default [`IdGenerator`]: 21 characters drawn uniformly from a 64-symbol URL-safe alphabet.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate_id(&self) -> String {
        let mut rng = thread_rng();
        (0..ID_LENGTH)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

impl<T: Fn() -> String> IdGenerator for T {
    fn generate_id(&self) -> String {
        self()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{IdGenerator, RandomIdGenerator, ALPHABET, ID_LENGTH};

    #[test]
    fn ids_have_fixed_length_and_alphabet() {
        let id = RandomIdGenerator.generate_id();
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1000).map(|_| RandomIdGenerator.generate_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn closures_are_generators() {
        let generator = || "fixed".to_owned();
        assert_eq!(generator.generate_id(), "fixed");
    }
}
