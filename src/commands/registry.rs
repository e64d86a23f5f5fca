// src/commands/registry.rs
use std::collections::HashMap;
use super::types::Command;

pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// A registry pre-populated with the external (non-builtin) commands
    /// the sandbox ships: file and text utilities that operate on the
    /// virtual filesystem rather than the host's.
    pub fn with_default_commands() -> Self {
        let mut registry = Self::new();

        // Core file and text utilities
        registry.register(Box::new(super::basename::BasenameCommand));
        registry.register(Box::new(super::cat::CatCommand));
        registry.register(Box::new(super::chmod::ChmodCommand));
        registry.register(Box::new(super::comm_cmd::CommCommand));
        registry.register(Box::new(super::column_cmd::ColumnCommand));
        registry.register(Box::new(super::cp::CpCommand));
        registry.register(Box::new(super::cut::CutCommand));
        registry.register(Box::new(super::date::DateCommand));
        registry.register(Box::new(super::diff_cmd::DiffCommand));
        registry.register(Box::new(super::dirname::DirnameCommand));
        registry.register(Box::new(super::du_cmd::DuCommand));
        registry.register(Box::new(super::echo::EchoCommand));
        registry.register(Box::new(super::env::EnvCommand));
        registry.register(Box::new(super::expand_cmd::ExpandCommand));
        registry.register(Box::new(super::expr_cmd::ExprCommand));
        registry.register(Box::new(super::file_cmd::FileCommand));
        registry.register(Box::new(super::find::FindCommand));
        registry.register(Box::new(super::fold_cmd::FoldCommand));
        registry.register(Box::new(super::grep::GrepCommand));
        registry.register(Box::new(super::head::HeadCommand));
        registry.register(Box::new(super::hostname_cmd::HostnameCommand));
        registry.register(Box::new(super::join::JoinCommand));
        registry.register(Box::new(super::ln::LnCommand));
        registry.register(Box::new(super::ls::LsCommand));
        registry.register(Box::new(super::md5sum::Md5sumCommand));
        registry.register(Box::new(super::mkdir::MkdirCommand));
        registry.register(Box::new(super::mv::MvCommand));
        registry.register(Box::new(super::nl::NlCommand));
        registry.register(Box::new(super::od_cmd::OdCommand));
        registry.register(Box::new(super::paste::PasteCommand));
        registry.register(Box::new(super::printf::PrintfCommand));
        registry.register(Box::new(super::pwd::PwdCommand));
        registry.register(Box::new(super::readlink_cmd::ReadlinkCommand));
        registry.register(Box::new(super::rev_cmd::RevCommand));
        registry.register(Box::new(super::rm::RmCommand));
        registry.register(Box::new(super::rmdir_cmd::RmdirCommand));
        registry.register(Box::new(super::sed::SedCommand));
        registry.register(Box::new(super::seq::SeqCommand));
        registry.register(Box::new(super::sleep_cmd::SleepCommand));
        registry.register(Box::new(super::sort::SortCommand));
        registry.register(Box::new(super::split_cmd::SplitCommand));
        registry.register(Box::new(super::stat_cmd::StatCommand));
        registry.register(Box::new(super::strings_cmd::StringsCommand));
        registry.register(Box::new(super::tac_cmd::TacCommand));
        registry.register(Box::new(super::tail::TailCommand));
        registry.register(Box::new(super::tee::TeeCommand));
        registry.register(Box::new(super::test_cmd::TestCommand));
        registry.register(Box::new(super::time_cmd::TimeCommand));
        registry.register(Box::new(super::timeout_cmd::TimeoutCommand));
        registry.register(Box::new(super::touch::TouchCommand));
        registry.register(Box::new(super::tr::TrCommand));
        registry.register(Box::new(super::tree_cmd::TreeCommand));
        registry.register(Box::new(super::true_cmd::TrueCommand));
        registry.register(Box::new(super::true_cmd::FalseCommand));
        registry.register(Box::new(super::uniq::UniqCommand));
        registry.register(Box::new(super::wc::WcCommand));
        registry.register(Box::new(super::which_cmd::WhichCommand));
        registry.register(Box::new(super::whoami_cmd::WhoamiCommand));
        registry.register(Box::new(super::xargs::XargsCommand));

        // Shell/session-adjacent commands, kept for scripts that invoke
        // them as ordinary external commands rather than shell builtins.
        registry.register(Box::new(super::alias_cmd::AliasCommand));
        registry.register(Box::new(super::unalias_cmd::UnaliasCommand));
        registry.register(Box::new(super::bash_cmd::BashCommand));
        registry.register(Box::new(super::clear_cmd::ClearCommand));
        registry.register(Box::new(super::help_cmd::HelpCommand));
        registry.register(Box::new(super::history_cmd::HistoryCommand));

        // Structured-data and network tooling carried over from the
        // teacher repo; not required by this interpreter's core spec but
        // kept registered until a final trim decides otherwise.
        registry.register(Box::new(super::base64_cmd::Base64Command));
        registry.register(Box::new(super::curl::CurlCommand));
        registry.register(Box::new(super::gzip::GzipCommand));
        registry.register(Box::new(super::html_to_markdown_cmd::HtmlToMarkdownCommand));
        registry.register(Box::new(super::jq::JqCommand));
        registry.register(Box::new(super::rg_cmd::RgCommand));
        registry.register(Box::new(super::tar::TarCommand));
        registry.register(Box::new(super::xan_cmd::XanCommand));
        registry.register(Box::new(super::yq::YqCommand));

        registry
    }

    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.keys().map(|s| s.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
