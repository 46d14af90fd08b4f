use bitflags::bitflags;
use serde::{Serialize, Serializer};

bitflags! {
    /// Categories of settings a document provisions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProvisionedSet: u32 {
        const PROXY = 0x0001;
        const CONNECTION_PROFILE = 0x0002;
        const BROWSER = 0x0004;
        const EMAIL = 0x0008;
        const MMS = 0x0010;
        const OMADS = 0x0020;
        const OMADM = 0x0040;
        const IMPS = 0x0080;
        const CONNECTION_RULES = 0x0100;
        const OMADL = 0x0200;
        const SUPL = 0x0400;
    }
}

const TYPE_NAMES: [(ProvisionedSet, &str); 11] = [
    (ProvisionedSet::PROXY, "proxy"),
    (ProvisionedSet::CONNECTION_PROFILE, "apn"),
    (ProvisionedSet::BROWSER, "bookmarks"),
    (ProvisionedSet::EMAIL, "email"),
    (ProvisionedSet::MMS, "mms"),
    (ProvisionedSet::OMADS, "omads"),
    (ProvisionedSet::OMADM, "omadm"),
    (ProvisionedSet::IMPS, "imps"),
    (ProvisionedSet::CONNECTION_RULES, "access-rules"),
    (ProvisionedSet::OMADL, "omadl"),
    (ProvisionedSet::SUPL, "supl"),
];

impl ProvisionedSet {
    /// Stable name of a single category, `None` for empty or combined sets.
    pub fn type_name(self) -> Option<&'static str> {
        TYPE_NAMES
            .iter()
            .find(|(flag, _)| *flag == self)
            .map(|(_, name)| *name)
    }

    /// Names of the categories in the set, lowest bit first.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        self.iter().filter_map(ProvisionedSet::type_name)
    }
}

impl Serialize for ProvisionedSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

/// Summary of what a document provisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub provisioned: ProvisionedSet,
    /// Server ids of the device management accounts asking for an immediate session.
    pub dm_sessions: Vec<String>,
}
