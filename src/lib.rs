// Copyright 2018-2020 Cargill Incorporated
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reading and editing of the policies attached to the groups of a channel configuration.
//!
//! The [`policies`](policies/index.html) module is the entry point. Policies are read from a
//! [`Config`](protocol/config/struct.Config.html) in their textual form with
//! [`get_policies_for_scope`](policies/fn.get_policies_for_scope.html), and written back with a
//! [`PolicyEditor`](policies/struct.PolicyEditor.html).

pub mod policies;
pub mod protocol;
pub mod protos;
