//! Convenience macros for entity spawning

/// Spawn an entity from a list of component values.
///
/// Expands to an [`EntityBuilder`](crate::ecs::EntityBuilder) chain committed
/// with a single [`World::spawn`](crate::ecs::World::spawn) call, so the
/// entity reaches its final component set in one step.
///
/// # Examples
///
/// ```ignore
/// let entity = spawn!(world,
///     Position { x: 0.0, y: 0.0 },
///     Velocity { x: 1.0, y: 1.0 },
/// )?;
/// ```
#[macro_export]
macro_rules! spawn {
    ($world:expr $(, $component:expr)+ $(,)?) => {{
        let builder = $crate::ecs::EntityBuilder::new()
            $(.with($component))+;
        $world.spawn(builder)
    }};
}
