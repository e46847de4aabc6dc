//! Generate-key command
//!
//! Prints a fresh key together with the prefix and hash the credential store
//! keeps. The random part can be pasted into `[[bootstrap.keys]]` as `secret`.

use clap::{Args, ValueEnum};

use crate::infrastructure::api_key::{ApiKeyGenerator, IssuedKey, KeyEnvironment};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum KeyEnv {
    #[default]
    Live,
    Test,
}

impl From<KeyEnv> for KeyEnvironment {
    fn from(env: KeyEnv) -> Self {
        match env {
            KeyEnv::Live => KeyEnvironment::Live,
            KeyEnv::Test => KeyEnvironment::Test,
        }
    }
}

#[derive(Debug, Args)]
pub struct KeygenArgs {
    /// Key environment, selects the `bsk_live_` or `bsk_test_` prefix
    #[arg(long, value_enum, default_value_t = KeyEnv::Live)]
    pub env: KeyEnv,
}

pub fn run(args: KeygenArgs) -> anyhow::Result<()> {
    let environment = KeyEnvironment::from(args.env);
    let issued = ApiKeyGenerator::new(environment).issue();

    println!("{}", render(environment, &issued));
    Ok(())
}

fn render(environment: KeyEnvironment, issued: &IssuedKey) -> String {
    let secret = issued
        .secret
        .strip_prefix(environment.type_prefix())
        .unwrap_or(&issued.secret);

    format!(
        "key:    {}\nsecret: {}\nprefix: {}\nhash:   {}",
        issued.secret, secret, issued.prefix, issued.hash
    )
}
