//! CLI enum types.

use clap::ValueEnum;

use crate::providers::ProviderKind;

/// Image provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    Grok,
    #[value(name = "openai")]
    OpenAi,
    Fallback,
}

impl From<ProviderArg> for ProviderKind {
    fn from(p: ProviderArg) -> Self {
        match p {
            ProviderArg::Grok => ProviderKind::Grok,
            ProviderArg::OpenAi => ProviderKind::OpenAi,
            ProviderArg::Fallback => ProviderKind::Fallback,
        }
    }
}
