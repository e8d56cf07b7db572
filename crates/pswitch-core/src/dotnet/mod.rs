//! .NET build file handling: project XML, the condition marker, and `dotnet sln`.

pub mod condition;
pub mod element;
pub mod project;
pub mod solution;
