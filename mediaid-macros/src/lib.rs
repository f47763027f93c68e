use darling::Error;
use darling::ast::NestedMeta;
use quote::quote;
use syn::{Data, DeriveInput, Fields, ItemStruct, parse_macro_input};

use proc_macro::TokenStream;

/// Derives `ReadBytesLe` and `ReadBytesBe` for a fixed-layout header.
///
/// Fields are read in declaration order, each through its own
/// `ReadBytesLe`/`ReadBytesBe` implementation.
#[proc_macro_derive(FromBytes)]
pub fn derive_from_bytes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;

    let (le_body, be_body) = match input.data {
        Data::Struct(ref s) => match s.fields {
            Fields::Named(ref nf) => {
                let idents: Vec<_> = nf.named.iter().filter_map(|f| f.ident.clone()).collect();
                (
                    quote! { Self { #( #idents: crate::utils::byteorder::ReadBytesLe::read_le(src)?, )* } },
                    quote! { Self { #( #idents: crate::utils::byteorder::ReadBytesBe::read_be(src)?, )* } },
                )
            }
            Fields::Unnamed(ref uf) => {
                let reads_le = uf
                    .unnamed
                    .iter()
                    .map(|_| quote! { crate::utils::byteorder::ReadBytesLe::read_le(src)? });
                let reads_be = uf
                    .unnamed
                    .iter()
                    .map(|_| quote! { crate::utils::byteorder::ReadBytesBe::read_be(src)? });
                (quote! { Self( #( #reads_le ),* ) }, quote! { Self( #( #reads_be ),* ) })
            }
            Fields::Unit => (quote! { Self }, quote! { Self }),
        },
        _ => {
            return TokenStream::from(
                syn::Error::new_spanned(&name, "FromBytes can only be derived for structs")
                    .to_compile_error(),
            );
        }
    };

    let expanded = quote! {
        impl crate::utils::byteorder::ReadBytesLe for #name {
            fn read_le(src: &mut &[u8]) -> Result<Self, crate::utils::errors::ByteOrderError> {
                Ok(#le_body)
            }
        }

        impl crate::utils::byteorder::ReadBytesBe for #name {
            fn read_be(src: &mut &[u8]) -> Result<Self, crate::utils::errors::ByteOrderError> {
                Ok(#be_body)
            }
        }
    };

    TokenStream::from(expanded)
}

/// Tags a header struct with the four-byte magic that precedes it,
/// e.g. `#[chunk_magic(b"fmt ")]`.
#[proc_macro_attribute]
pub fn chunk_magic(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(v) => v,
        Err(e) => {
            return TokenStream::from(Error::from(e).write_errors());
        }
    };

    let Some(first) = args.first() else {
        return TokenStream::from(Error::custom("chunk_magic expects a byte string").write_errors());
    };

    let magic_bytes = match first {
        NestedMeta::Lit(syn::Lit::ByteStr(bs)) => bs.value(),
        _ => {
            return TokenStream::from(
                syn::Error::new_spanned(first, "chunk_magic expects a byte string, e.g. b\"fmt \"")
                    .to_compile_error(),
            );
        }
    };

    if magic_bytes.len() != 4 {
        return TokenStream::from(
            syn::Error::new_spanned(first, "chunk_magic expects 4 bytes").to_compile_error(),
        );
    }
    let magic_tokens = {
        let b = magic_bytes;
        quote! {[#(#b),*]}
    };

    let input = parse_macro_input!(item as ItemStruct);
    let name = &input.ident;

    let expanded = quote! {
        #input

        impl crate::utils::byteorder::Chunk for #name {
            const MAGIC: [u8; 4] = #magic_tokens;
        }
    };
    TokenStream::from(expanded)
}
