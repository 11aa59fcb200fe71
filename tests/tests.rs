// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod engine;
mod parser;
