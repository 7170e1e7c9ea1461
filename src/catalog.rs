//! The fixed set of third-party libraries generated sites may import.
//!
//! The validator uses it to decide which unresolved symbols can be repaired
//! with a synthesized import; the sandbox uses it to resolve imports to
//! in-process stand-ins.

/// Package names the preview can resolve. Anything else becomes a stub.
pub const WHITELISTED_LIBRARIES: &[&str] = &[
    "react",
    "framer-motion",
    "lucide-react",
    "next/link",
    "next/image",
    "next/navigation",
    "clsx",
    "react-intersection-observer",
];

pub const ICON_LIBRARY: &str = "lucide-react";

/// `lucide-react` exports the repairer may import on demand.
pub const LUCIDE_ICONS: &[&str] = &[
    "Activity", "Airplay", "AlarmClock", "AlertCircle", "AlertTriangle", "Anchor", "Aperture",
    "Archive", "ArrowDown", "ArrowDownRight", "ArrowLeft", "ArrowRight", "ArrowUp", "ArrowUpRight",
    "AtSign", "Award", "BadgeCheck", "BarChart", "BarChart2", "Battery", "Bell", "Book", "BookOpen",
    "Bookmark", "Box", "Brain", "Briefcase", "Brush", "Bug", "Building", "Calendar", "Camera",
    "Check", "CheckCircle", "ChevronDown", "ChevronLeft", "ChevronRight", "ChevronUp", "Circle",
    "Clapperboard", "Clipboard", "Clock", "Cloud", "Code", "Code2", "Codepen", "Coffee", "Cog",
    "Compass", "Copy", "Cpu", "CreditCard", "Crown", "Database", "Diamond", "Download", "Dribbble",
    "Droplet", "Edit", "ExternalLink", "Eye", "Facebook", "Feather", "File", "FileText", "Film",
    "Filter", "Flag", "Flame", "Folder", "Gamepad2", "Gem", "Gift", "GitBranch", "Github", "Gitlab",
    "Globe", "GraduationCap", "Grid", "Hash", "Headphones", "Heart", "HelpCircle", "Home", "Image",
    "Inbox", "Info", "Instagram", "Key", "Laptop", "Layers", "Layout", "Leaf", "Lightbulb", "Link",
    "Link2", "Linkedin", "List", "Loader", "Loader2", "Lock", "LogIn", "LogOut", "Mail", "Map",
    "MapPin", "Maximize", "Menu", "MessageCircle", "MessageSquare", "Mic", "Minus", "Monitor", "Moon",
    "MousePointer", "Music", "Palette", "Paperclip", "Pause", "PenTool", "Pencil", "Phone", "Play",
    "Plus", "Pocket", "Quote", "Radio", "RefreshCw", "Rocket", "Rss", "Save", "Scissors", "Search",
    "Send", "Server", "Settings", "Share", "Share2", "Shield", "ShoppingBag", "ShoppingCart",
    "Sparkle", "Sparkles", "Speaker", "Star", "Sun", "Tag", "Target", "Terminal", "ThumbsUp", "Timer",
    "Trash", "Trash2", "TrendingUp", "Trophy", "Truck", "Tv", "Twitter", "Type", "Umbrella", "Upload",
    "User", "UserPlus", "Users", "Video", "Volume2", "Wand2", "Watch", "Wifi", "Wind", "X", "Youtube",
    "Zap",
];

/// Default-exported components of whitelisted packages. Both names are also
/// icons, so usage decides which import the repairer writes.
pub const COMPONENT_DEFAULTS: &[(&str, &str)] = &[("Link", "next/link"), ("Image", "next/image")];

/// `framer-motion` exports that render their children unchanged.
pub const MOTION_PASSTHROUGH: &[&str] = &["AnimatePresence", "MotionConfig", "LayoutGroup", "LazyMotion"];

#[must_use]
pub fn is_whitelisted(source: &str) -> bool {
    WHITELISTED_LIBRARIES.contains(&source)
}

/// Known icon export. `lucide-react` also exports every icon with an `Icon`
/// suffix (`GithubIcon`).
#[must_use]
pub fn is_known_icon(name: &str) -> bool {
    LUCIDE_ICONS.contains(&name)
        || name
            .strip_suffix("Icon")
            .is_some_and(|base| LUCIDE_ICONS.contains(&base))
}

/// Package whose default export is the component named `name`.
#[must_use]
pub fn component_default(name: &str) -> Option<&'static str> {
    COMPONENT_DEFAULTS.iter().find(|(n, _)| *n == name).map(|(_, source)| *source)
}
