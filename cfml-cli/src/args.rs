//! Command-line values mapped onto library options.

use cfml_lower::AttributePolicy;
use cfml_parser::{EntryRule, ParseOptions, Strategy};
use clap::{Args, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntryArg {
    /// A sequence of statements
    Script,
    /// A single expression
    Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Adaptive,
    Fast,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Ignore,
    Warn,
    Deny,
}

impl From<PolicyArg> for AttributePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Ignore => AttributePolicy::Ignore,
            PolicyArg::Warn => AttributePolicy::Warn,
            PolicyArg::Deny => AttributePolicy::Deny,
        }
    }
}

/// Parser flags shared by the commands that parse.
/// 解析相关的共享参数。
#[derive(Debug, Clone, Args)]
pub struct ParseArgs {
    /// Start rule. / 入口规则。
    #[arg(long, value_enum, default_value = "script")]
    pub entry: EntryArg,

    /// Prediction stages to use. / 使用的预测阶段。
    #[arg(long, value_enum, default_value = "adaptive")]
    pub strategy: StrategyArg,
}

impl ParseArgs {
    pub fn options(&self) -> ParseOptions {
        let entry = match self.entry {
            EntryArg::Script => EntryRule::ScriptBlock,
            EntryArg::Expression => EntryRule::Expression,
        };
        let strategy = match self.strategy {
            StrategyArg::Adaptive => Strategy::Adaptive,
            StrategyArg::Fast => Strategy::FastOnly,
            StrategyArg::General => Strategy::GeneralOnly,
        };
        ParseOptions::new().with_entry(entry).with_strategy(strategy)
    }
}
