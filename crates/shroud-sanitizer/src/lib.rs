//! Policy-driven HTML sanitization for Shroud.
//!
//! [`sanitize`] turns untrusted markup into a detached [`shroud_dom::Dom`]
//! that contains only the tags a [`SanitizationPolicy`] permits. The
//! allow-list algorithm itself is `ammonia`'s; this crate maps a policy onto
//! it and runs the policy's [`Hooks`] around the engine pass.
//!
//! Hooks travel with the policy passed to each call. There is no shared
//! registry, so two documents rendered side by side never see each other's
//! hooks.
//!
//! # Example
//!
//! ```
//! use shroud_sanitizer::{HookStage, SanitizationPolicy, sanitize};
//!
//! let policy = SanitizationPolicy::new()
//!     .deny_tags(["style"])
//!     .hook(HookStage::AfterSanitizeAttributes, |dom, node| {
//!         if dom.tag_name(node) == Some("img") {
//!             dom.set_attr(node, "loading", "lazy");
//!         }
//!     });
//!
//! let dom = sanitize(r#"<p onclick="x()">Hi<img src="a.png"></p><style>p{}</style>"#, &policy)
//!     .expect("markup is not empty");
//! assert_eq!(dom.to_html(), r#"<p>Hi<img src="a.png" loading="lazy"></p>"#);
//! ```

mod hooks;
mod policy;
mod sanitize;

pub use hooks::{Hook, HookStage, Hooks, UnknownHookStage};
pub use policy::SanitizationPolicy;
pub use sanitize::sanitize;
