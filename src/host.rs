//! Host renderer seam.
//!
//! The reconciler is generic over a [`Host`]: the thing that owns real
//! instances (DOM nodes, terminal cells, test records). Instances are
//! addressed by [`InstanceId`] handles, so fibers never hold host types.
//!
//! The commit phase is the only caller of the mutation methods, and it
//! calls them in effect-list order without interruption.

use crate::types::{InstanceId, Props};

/// Renderer backend contract.
pub trait Host {
    /// Create an instance for a host element. Children are attached
    /// afterwards via `append_child` before the instance is placed.
    fn create_instance(&mut self, ty: &str, props: &Props) -> InstanceId;

    /// Create an instance for a text node.
    fn create_text_instance(&mut self, text: &str) -> InstanceId;

    /// Append `child` as the last child of `parent`.
    fn append_child(&mut self, parent: InstanceId, child: InstanceId);

    /// Insert `child` into `parent` immediately before `before`.
    fn insert_before(&mut self, parent: InstanceId, child: InstanceId, before: InstanceId);

    /// Remove `child` from `parent`, dropping its subtree.
    fn remove_child(&mut self, parent: InstanceId, child: InstanceId);

    /// Apply a props update to an existing instance.
    fn commit_update(&mut self, instance: InstanceId, old_props: &Props, new_props: &Props);

    /// Apply a text update to a text instance.
    fn commit_text_update(&mut self, instance: InstanceId, old_text: &str, new_text: &str);

    /// Clear the text content of an instance before new children are
    /// placed under it.
    fn reset_text_content(&mut self, instance: InstanceId);
}
