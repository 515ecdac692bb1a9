/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use std::fmt;
use ansi_term::Style;

macro_rules! each_fmt_trait {
    ($mac:ident!)
    => {
        $mac!(std::fmt::Display);
        $mac!(std::fmt::LowerExp);
    }
}

pub fn paint<T>(style: Style, value: T) -> Wrapper<T, T>
{ gpaint(style, value) }

pub fn gpaint<U, T>(style: Style, value: U) -> Wrapper<U, T>
{ Wrapper { style, value, _target: Default::default() } }

/// A wrapper for colorizing formatting traits like `Display`.
///
/// It has two parameters so that it can `borrow()` `U` as `T` when it wants to.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Wrapper<U, T=U> {
    style: Style,
    value: U,
    _target: std::marker::PhantomData<T>,
}

macro_rules! derive_fmt_impl {
    ($Trait:path)
    => {
        impl<U, T> $Trait for Wrapper<U, T>
        where
            U: std::borrow::Borrow<T>,
            T: $Trait,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.style.prefix())?;
                T::fmt(self.value.borrow(), f)?;
                write!(f, "{}", self.style.suffix())?;
                Ok(())
            }
        }
    };
}

each_fmt_trait!{derive_fmt_impl!}
